use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use clap::{Parser, Subcommand};
use common::db;
use ecommerce_api::{config::Config, configure, security::configure_cors, AppState};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API
    Serve {
        #[clap(long)]
        host: Option<String>,
        #[clap(long)]
        port: Option<u16>,
    },

    /// Create any missing tables and exit
    InitDb,
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    let default_level = if config.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let pool = db::establish_connection(&config.database_url, config.database_max_connections)
        .await
        .context("failed to open the database")?;
    db::create_schema(&pool)
        .await
        .context("failed to create tables")?;

    match cli.command {
        Commands::InitDb => {
            info!("Tables created in {}", config.database_url);
        }
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server_host = host;
            }
            if let Some(port) = port {
                config.server_port = port;
            }

            let app_state = web::Data::new(AppState { pool });
            let allowed_origins = config.allowed_origins.clone();

            info!("Starting HTTP server on {}", config.server_address());
            HttpServer::new(move || {
                App::new()
                    .app_data(app_state.clone())
                    .wrap(Logger::default())
                    .wrap(configure_cors(&allowed_origins))
                    .configure(configure)
            })
            .bind(config.server_address())?
            .run()
            .await?;
        }
    }

    Ok(())
}
