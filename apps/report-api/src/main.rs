//! Report API Server
//!
//! Renders report paragraphs from per-fact-code templates and keeps a
//! history of generated paragraphs per user:
//!
//! - Template storage and field listing
//! - Rendering with conditional fields and the stop clause
//! - Recent-entry recommendations, suggestions and saving

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;
use template_engine::RecommenderConfig;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod db;
mod error;
mod handlers;
mod models;
mod seed;
mod state;
#[cfg(test)]
mod tests;

use state::AppState;

/// Command-line arguments for the report API
#[derive(Parser, Debug)]
#[command(name = "report-api")]
#[command(about = "Report paragraph rendering and history server")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    /// SQLite database URL (defaults to the platform data directory)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// TOML file with templates to store on startup
    #[arg(long, env = "SEED_TEMPLATES")]
    seed_templates: Option<PathBuf>,

    /// How many recent entries to fetch per fact code
    #[arg(long, default_value = "100")]
    recent_limit: usize,

    /// Maximum number of location suggestions
    #[arg(long, default_value = "8")]
    suggestion_limit: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn recommender_config(&self) -> RecommenderConfig {
        RecommenderConfig {
            recent_limit: self.recent_limit,
            suggestion_limit: self.suggestion_limit,
            ..RecommenderConfig::default()
        }
    }
}

/// Build the router with all routes and middleware
pub fn app(state: Arc<AppState>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(handlers::health))
        // Templates
        .route(
            "/api/templates/:factcode",
            get(handlers::get_template).put(handlers::put_template),
        )
        .route("/api/templates/:factcode/render", post(handlers::render))
        // History
        .route("/api/templates/:factcode/recent", get(handlers::recent))
        .route(
            "/api/templates/:factcode/suggestions",
            get(handlers::suggestions),
        )
        .route("/api/templates/:factcode/banner", post(handlers::banner))
        .route(
            "/api/templates/:factcode/entries",
            post(handlers::save_entry),
        )
        .route("/api/entries/:id/load", post(handlers::load_entry))
        // Apply middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose {
        "report_api=debug,template_engine=debug,tower_http=debug"
    } else {
        "report_api=info,template_engine=info,tower_http=debug"
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting report API on {}:{}", args.host, args.port);

    // Create shared state
    let state = Arc::new(AppState::new(args.database_url.clone(), args.recommender_config()).await?);

    if let Some(path) = &args.seed_templates {
        seed::load_seed_file(path, state.store.as_ref()).await?;
    }

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!(
        "Recent limit: {}, suggestion limit: {}",
        args.recent_limit, args.suggestion_limit
    );

    axum::serve(listener, app(state)).await?;

    Ok(())
}
