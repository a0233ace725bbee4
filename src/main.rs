use clap::Parser;
use reportforge::models::{AppState, RunRegistry};
use reportforge::report::{generate_report, EnvClientFactory, WorkflowOptions};
use reportforge::routes::create_router;
use reportforge::storage::ReportStore;
use reportforge::Config;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "reportforge", about = "AI research report generator")]
struct Cli {
    /// Generate one report for this topic on the command line and exit
    /// instead of serving HTTP.
    #[arg(long)]
    topic: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing: stdout plus a daily-rolling file in logs/.
    let file_appender = tracing_appender::rolling::daily("logs", "reportforge.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reportforge=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let factory = Arc::new(EnvClientFactory::new(&config));

    // One-shot CLI mode: run the workflow in the foreground and print.
    if let Some(topic) = cli.topic {
        let report = generate_report(
            &topic,
            factory,
            WorkflowOptions {
                recursion_limit: config.report.recursion_limit,
                progress: None,
            },
        )
        .await?;
        println!("{}", "=".repeat(50));
        println!("Final Report:");
        println!("{}", "=".repeat(50));
        println!("{}", report);
        return Ok(());
    }

    // Report store is optional; without it, saved-report routes refuse.
    let store = match ReportStore::from_config(&config.storage) {
        Ok(store) => Some(Arc::new(store)),
        Err(e) => {
            warn!(error = %e, "report store unavailable, saved reports disabled");
            None
        }
    };

    // Create shared state
    let state = AppState {
        config: config.clone(),
        factory,
        store,
        runs: RunRegistry::default(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
