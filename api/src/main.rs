use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;
use tracing::{error, info};

use appstack::bootstrap::app_context::{AppContext, AppServices};
use appstack::bootstrap::config::Config;
use appstack::bootstrap::env::{self, EnvSchema};
use appstack::infrastructure::db::repositories::session_repository_sqlx::SqlxSessionRepository;
use appstack::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;
use appstack::infrastructure::db::repositories::verification_repository_sqlx::SqlxVerificationRepository;
use appstack::infrastructure::mail::smtp_mailer::SmtpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "appstack=debug,axum=info,tower_http=info".into()),
        )
        .init();

    // Fail fast before touching the database
    let source = env::process_env();
    let schema = EnvSchema::app()?;
    let validated = match schema.load(&source, env::should_skip_validation(&source)) {
        Ok(v) => v,
        Err(e) => {
            for issue in e.issues() {
                error!(%issue, "invalid_env");
            }
            return Err(e.into());
        }
    };
    let cfg = Config::from_env(&validated)?;
    info!(?cfg, "Starting appstack");

    // Database
    let pool = appstack::infrastructure::db::connect_pool(&cfg.database_url).await?;
    appstack::infrastructure::db::migrate(&pool).await?;

    let user_repo = Arc::new(SqlxUserRepository::new(pool.clone()));
    let session_repo = Arc::new(SqlxSessionRepository::new(pool.clone()));
    let verification_repo = Arc::new(SqlxVerificationRepository::new(pool.clone()));
    let mailer = Arc::new(SmtpMailer::new(&cfg.smtp)?);

    let services = AppServices::new(user_repo, session_repo, verification_repo, mailer);
    let ctx = AppContext::new(cfg.clone(), services);

    if tokio::fs::metadata(&cfg.static_dir).await.is_err() {
        tracing::warn!(dir = %cfg.static_dir, "static bundle directory missing");
    }

    let app = appstack::presentation::http::router(ctx);

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "App is running");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(?e, "failed to listen for shutdown signal");
    }
}
