//! sharpii server binary.
//!
//! Loads configuration, connects to Postgres, wires adapters into the
//! application state and serves the HTTP API until Ctrl+C or SIGTERM.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use sharpii::adapters::auth::{
    CompositeSessionValidator, PostgresSessionValidator, SupabaseJwtConfig, SupabaseJwtValidator,
};
use sharpii::adapters::dodo::{DodoConfig, DodoPaymentAdapter};
use sharpii::adapters::enhancement::{
    ReplicateConfig, ReplicateProvider, RunningHubConfig, RunningHubProvider,
};
use sharpii::adapters::http::{app_router, AppState, AuthState, RouterOptions};
use sharpii::adapters::postgres::{
    self, PostgresCheckoutSessionRepository, PostgresCreditPurchaseRepository,
    PostgresCreditRepository, PostgresPaymentRepository, PostgresSubscriptionRepository,
    PostgresTaskRepository, PostgresWebhookEventRepository,
};
use sharpii::application::handlers::payments::ProductCatalog;
use sharpii::application::handlers::tasks::EnhancementProviders;
use sharpii::config::AppConfig;
use sharpii::ports::{EnhancementProvider, SessionValidator};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("sharpii exited with error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("loading configuration")?;
    init_tracing(&config);
    config.validate().context("validating configuration")?;

    let pool = postgres::connect(&config.database)
        .await
        .context("connecting to Postgres")?;
    info!("Postgres connection pool established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        info!("Database migrations applied");
    }

    let payment_provider = DodoPaymentAdapter::new(
        DodoConfig::new(
            config.payment.dodo_api_key.clone(),
            config.payment.dodo_webhook_secret.clone(),
        )
        .with_base_url(config.payment.api_base_url()),
    )
    .context("configuring Dodo Payments")?;

    let state = AppState {
        payment_provider: Arc::new(payment_provider),
        credits: Arc::new(PostgresCreditRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool.clone())),
        payments: Arc::new(PostgresPaymentRepository::new(pool.clone())),
        checkout_sessions: Arc::new(PostgresCheckoutSessionRepository::new(pool.clone())),
        purchases: Arc::new(PostgresCreditPurchaseRepository::new(pool.clone())),
        webhook_events: Arc::new(PostgresWebhookEventRepository::new(pool.clone())),
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        providers: enhancement_providers(&config)?,
        catalog: ProductCatalog::from(&config.payment),
        checkout_timeout: config.payment.checkout_timeout(),
        app_url: config.server.app_url().map(str::to_string),
    };

    let validator: Arc<dyn SessionValidator> = Arc::new(CompositeSessionValidator::new(
        Arc::new(SupabaseJwtValidator::new(SupabaseJwtConfig::new(
            config.auth.supabase_jwt_secret.clone(),
            config.auth.jwt_audience.clone(),
        ))),
        Arc::new(PostgresSessionValidator::new(pool.clone())),
    ));
    let auth = AuthState::from_config(validator, &config.auth);

    let options = RouterOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let app = app_router(state, auth, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!(%addr, environment = ?config.server.environment, "sharpii listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    pool.close().await;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn enhancement_providers(config: &AppConfig) -> Result<EnhancementProviders> {
    let ai = &config.ai;
    let mut providers: Vec<Arc<dyn EnhancementProvider>> = Vec::new();

    if let Some(token) = ai.replicate_api_token.as_deref().filter(|t| !t.is_empty()) {
        let provider = ReplicateProvider::new(
            ReplicateConfig::new(token)
                .with_base_url(ai.replicate_base_url.clone())
                .with_timeout(ai.timeout()),
        )
        .context("configuring Replicate")?;
        providers.push(Arc::new(provider));
    }

    if let (Some(key), Some(workflow)) = (
        ai.runninghub_api_key.as_deref().filter(|k| !k.is_empty()),
        ai.runninghub_workflow_id.as_deref().filter(|w| !w.is_empty()),
    ) {
        let provider = RunningHubProvider::new(
            RunningHubConfig::new(key, workflow)
                .with_image_node(ai.runninghub_image_node_id.clone())
                .with_base_url(ai.runninghub_base_url.clone())
                .with_timeout(ai.timeout()),
        )
        .context("configuring RunningHub")?;
        providers.push(Arc::new(provider));
    }

    if providers.is_empty() {
        warn!("No enhancement provider configured; task submission will fail");
    }
    Ok(EnhancementProviders::new(providers))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
