//! Adria - Adria Style Studio backend

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use adria::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{SqlxArticleRepository, SqlxSubscriberRepository, SqlxUserRepository},
        DynDatabasePool,
    },
    services::{
        ArticleService, Mailer, PasswordResetOptions, SubscriberService, TokenService,
        UserService,
    },
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "adria=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        tracing::error!("Fatal: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    tracing::info!("Starting Adria API...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = bootstrap(&config).await?;

    // Services
    let mailer = Mailer::from_config(&config.smtp)?;
    let tokens = TokenService::from_config(&config.auth);
    let reset = PasswordResetOptions::from_config(&config.auth, mailer);

    let state = AppState {
        pool: pool.clone(),
        user_service: Arc::new(UserService::with_reset_options(
            SqlxUserRepository::boxed(pool.clone()),
            tokens,
            reset,
        )),
        article_service: Arc::new(ArticleService::new(SqlxArticleRepository::boxed(
            pool.clone(),
        ))),
        subscriber_service: Arc::new(SubscriberService::new(SqlxSubscriberRepository::boxed(
            pool.clone(),
        ))),
        cookie_secure: config.auth.cookie_secure,
    };

    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool.close().await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Connect, migrate and seed. Any failure here aborts startup.
async fn bootstrap(config: &Config) -> Result<DynDatabasePool> {
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    let applied = db::migrations::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    let report = db::seed::seed(&pool, &config.seed)
        .await
        .context("Failed to seed database")?;
    if report.admin_created {
        tracing::info!("Created default admin account {}", config.seed.admin_email);
    }
    if report.articles_created > 0 {
        tracing::info!("Inserted {} sample articles", report.articles_created);
    }

    Ok(pool)
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Ctrl+C received, starting graceful shutdown"),
        _ = terminate => tracing::info!("SIGTERM received, starting graceful shutdown"),
    }
}
