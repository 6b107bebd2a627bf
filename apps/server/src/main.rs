//! GitDocx web server: queue conversions over HTTP and serve the documents.

mod error;
mod routes;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

use gitdocx_jobs::{JobService, JobStore, WorkerPool};
use gitdocx_shared::{CrawlConfig, load_config, load_config_from};

pub struct AppState {
    pub jobs: JobService,
}

/// GitDocx server: HTTP front-end for background conversions.
#[derive(Parser)]
#[command(name = "gitdocx-server", version, long_about = None)]
struct Cli {
    /// Config file (defaults to ~/.gitdocx/gitdocx.toml).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Bind address (overrides `server.host`).
    #[arg(long)]
    host: Option<String>,

    /// Bind port (overrides `server.port`).
    #[arg(long)]
    port: Option<u16>,

    /// Emit logs as JSON.
    #[arg(long)]
    json_logs: bool,
}

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gitdocx=info,actix_web=info"));
    if cli.json_logs {
        fmt().json().with_env_filter(env_filter).init();
    } else {
        fmt().with_env_filter(env_filter).init();
    }

    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    let host = cli.host.unwrap_or_else(|| config.server.host.clone());
    let port = cli.port.unwrap_or(config.server.port);

    let store = JobStore::new();
    let (_pool, queue) = WorkerPool::start(config.server.workers, store.clone());
    let jobs = JobService::new(
        store,
        queue,
        &config.server.output_root,
        CrawlConfig::from(&config),
        env!("CARGO_PKG_VERSION"),
    );
    let shared_state = web::Data::new(AppState { jobs });

    info!(
        %host,
        port,
        workers = config.server.workers,
        output_root = %config.server.output_root,
        "starting GitDocx server"
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(shared_state.clone())
            .configure(routes::register)
    })
    .bind((host.as_str(), port))?
    .run()
    .await?;

    Ok(())
}
