pub mod acos;
pub mod crud;
pub mod login;
pub mod organizations;
