pub mod manager;
pub mod models;
pub mod resource;

pub use manager::{DatabaseError, pool};
pub use resource::Resource;
