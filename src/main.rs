use ballpark_savings::orchestration::{AccrualRunner, Orchestrator, SystemClock};
use ballpark_savings::store::AccrualStore;
use ballpark_savings::{api, config::Config, db::init_db, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let store: Arc<dyn AccrualStore> = repo.clone();
    let runner = Arc::new(AccrualRunner::new(store, config.run_settings()));
    let orchestrator = Arc::new(Orchestrator::new(
        runner.clone(),
        Arc::new(SystemClock),
        config.retry_policy(),
        config.run_at,
    ));

    // One-shot mode for manual backfills
    if let Some(date) = config.run_date {
        match orchestrator.run_with_retry(date).await {
            Ok(summary) => {
                tracing::info!(
                    %date,
                    accounts_processed = summary.accounts_processed,
                    total_accrued = summary.total_accrued,
                    "Accrual complete"
                );
                return;
            }
            Err(e) => {
                eprintln!("Accrual failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    let scheduler = orchestrator.clone();
    tokio::spawn(async move { scheduler.run_scheduled().await });

    let app = api::create_router(api::AppState::new(repo, runner));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!(run_at = %config.run_at, "Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
