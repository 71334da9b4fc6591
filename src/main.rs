use anyhow::Context;
use axum::{
    routing::{get, post},
    Router,
};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use care_admin_api::database::models::{user, Aco, Organization, Program, Saving, Workshop};
use care_admin_api::handlers::{acos, crud, login, organizations};
use care_admin_api::middleware::jwt_auth_middleware;
use care_admin_api::{auth, config, database};

#[derive(Parser)]
#[command(name = "care-admin-api")]
#[command(about = "Administrative CRUD API for organizations, programs, ACOs, savings, and workshops")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Run the HTTP API server (default)")]
    Serve,

    #[command(about = "Provision an API user")]
    CreateUser {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => serve().await,
        Commands::CreateUser {
            username,
            password,
            email,
            first_name,
            last_name,
        } => create_user(username, password, email, first_name, last_name).await,
    };

    if let Err(e) = result {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn serve() -> anyhow::Result<()> {
    let config = config::config();
    tracing::info!("Starting care-admin-api in {:?} mode", config.environment);

    // The server can come up without a store; protected routes then answer
    // 503 while auth rejections still work, which is what the tests rely on.
    if let Err(e) = database::manager::migrate().await {
        tracing::warn!("migrations not applied: {}", e);
    }

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("care-admin-api listening on http://{}", bind_addr);
    axum::serve(listener, app()).await.context("server")?;
    Ok(())
}

async fn create_user(
    username: String,
    password: String,
    email: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
) -> anyhow::Result<()> {
    database::manager::migrate().await?;
    let pool = database::pool().await?;

    let password_hash = auth::generate_password_hash(&password);
    let id = user::create(
        &pool,
        &username,
        &password_hash,
        email.as_deref(),
        first_name.as_deref(),
        last_name.as_deref(),
    )
    .await?;

    println!("Created user {} (id {})", username, id);
    Ok(())
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/login", post(login::login))
        .route("/login/refresh", post(login::refresh))
        // Protected resources behind the JWT layer
        .merge(resource_routes().layer(axum::middleware::from_fn(jwt_auth_middleware)))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn resource_routes() -> Router {
    Router::new()
        .route(
            "/organizations",
            get(crud::list::<Organization>).post(crud::create::<Organization>),
        )
        .route(
            "/organizations/:id",
            // Single-item GET is the one action returning the detail shape
            get(organizations::retrieve)
                .put(crud::update::<Organization>)
                .patch(crud::update::<Organization>)
                .delete(crud::destroy::<Organization>),
        )
        .route(
            "/programs",
            get(crud::list::<Program>).post(crud::create::<Program>),
        )
        .route(
            "/programs/:id",
            get(crud::retrieve::<Program>)
                .put(crud::update::<Program>)
                .patch(crud::update::<Program>)
                .delete(crud::destroy::<Program>),
        )
        .route("/acos", get(acos::list).post(crud::create::<Aco>))
        .route(
            "/acos/:id",
            get(crud::retrieve::<Aco>)
                .put(crud::update::<Aco>)
                .patch(crud::update::<Aco>)
                .delete(crud::destroy::<Aco>),
        )
        .route(
            "/savings",
            get(crud::list::<Saving>).post(crud::create::<Saving>),
        )
        .route(
            "/savings/:id",
            get(crud::retrieve::<Saving>)
                .put(crud::update::<Saving>)
                .patch(crud::update::<Saving>)
                .delete(crud::destroy::<Saving>),
        )
        .route(
            "/workshops",
            get(crud::list::<Workshop>).post(crud::create::<Workshop>),
        )
        .route(
            "/workshops/:id",
            get(crud::retrieve::<Workshop>)
                .put(crud::update::<Workshop>)
                .patch(crud::update::<Workshop>)
                .delete(crud::destroy::<Workshop>),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "care-admin-api",
        "version": version,
        "endpoints": {
            "login": "POST /login, POST /login/refresh (public)",
            "organizations": "/organizations[/:id] (bearer token)",
            "programs": "/programs[/:id] (bearer token)",
            "acos": "/acos[?organization=:id][/:id] (bearer token)",
            "savings": "/savings[/:id] (bearer token)",
            "workshops": "/workshops[/:id] (bearer token)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match database::manager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
