//! linkpdf server
//!
//! Turns a configured design frame into a one-page PDF whose button opens a
//! caller-supplied link. Two front ends share one [`Generator`]:
//!
//! - HTTP: `POST /generate_pdf`, `GET /health`
//! - Telegram bot (enabled when `BOT_TOKEN` is set), restricted to an
//!   allow-list kept in SQLite
//!
//! Configuration comes from flags or the environment; a `.env` file is
//! loaded first if present.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use figma_client::FigmaClient;
use linkpdf_core::{
    DesignTarget, ExportSettings, Generator, GeneratorConfig, DEFAULT_EXPORT_SCALE,
    DEFAULT_UNIT_CONVERSION,
};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod bot;
mod error;
mod state;
mod store;

use bot::telegram::TelegramClient;
use bot::BotContext;
use state::AppState;
use store::AllowList;

/// Command-line arguments, each with an environment fallback
#[derive(Parser, Debug)]
#[command(name = "linkpdf-server")]
#[command(about = "Serves design-frame PDFs with a clickable link over HTTP and Telegram")]
struct Args {
    /// Figma personal access token
    #[arg(long, env = "FIGMA_TOKEN", hide_env_values = true)]
    figma_token: String,

    /// Figma file key of the design document
    #[arg(long, env = "FILE_KEY")]
    file_key: String,

    /// Page holding the frame and the button
    #[arg(long, env = "PAGE_NAME")]
    page_name: String,

    /// Frame rendered as the page background
    #[arg(long, env = "FRAME_NAME")]
    frame_name: String,

    /// Element that becomes the clickable region
    #[arg(long, env = "BUTTON_NAME")]
    button_name: String,

    /// Render magnification requested from Figma
    #[arg(long, env = "EXPORT_SCALE", default_value_t = DEFAULT_EXPORT_SCALE)]
    export_scale: f64,

    /// Design pixels to PDF points
    #[arg(long, env = "UNIT_CONVERSION", default_value_t = DEFAULT_UNIT_CONVERSION)]
    unit_conversion: f64,

    #[arg(long, env = "FIGMA_API_URL", default_value = figma_client::DEFAULT_API_URL)]
    figma_api_url: String,

    /// Timeout for each remote call in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "30")]
    request_timeout_secs: u64,

    /// Host address to bind to
    #[arg(long, env = "API_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "API_PORT", default_value = "8000")]
    port: u16,

    /// File name given to generated documents
    #[arg(long, env = "OUTPUT_FILENAME", default_value = "Verification.pdf")]
    output_filename: String,

    /// Telegram bot token; the bot stays off without it
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Telegram user ids with admin rights, comma separated
    #[arg(long, env = "ADMIN_IDS", value_delimiter = ',')]
    admin_ids: Vec<i64>,

    /// Allow-list database
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:users.db?mode=rwc")]
    database_url: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn generator_config(&self) -> anyhow::Result<GeneratorConfig> {
        let export = ExportSettings {
            scale: self.export_scale,
            unit_conversion: self.unit_conversion,
        };
        export
            .validate()
            .map_err(|e| anyhow::anyhow!("Invalid export settings: {}", e))?;

        Ok(GeneratorConfig {
            target: DesignTarget {
                file_key: self.file_key.clone(),
                page_name: self.page_name.clone(),
                frame_name: self.frame_name.clone(),
                button_name: self.button_name.clone(),
            },
            export,
        })
    }
}

async fn start_bot(args: &Args, token: &str, generator: Arc<Generator>) -> anyhow::Result<()> {
    let store = AllowList::connect(&args.database_url)
        .await
        .context("Failed to open allow-list database")?;
    let client = TelegramClient::new(token)?;

    let admins: HashSet<i64> = args.admin_ids.iter().copied().collect();
    if admins.is_empty() {
        warn!("No ADMIN_IDS configured; the allow-list can only be edited in the database");
    }

    info!(
        "Starting Telegram bot ({} admins, {} allowed users)",
        admins.len(),
        store.count().await?
    );

    let context = Arc::new(BotContext::new(
        Arc::new(client.clone()),
        generator,
        store,
        admins,
        args.output_filename.clone(),
    ));
    tokio::spawn(bot::run(client, context));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = args.generator_config()?;
    info!(
        "Design target: page '{}', frame '{}', button '{}' (scale {}, conversion {})",
        config.target.page_name,
        config.target.frame_name,
        config.target.button_name,
        config.export.scale,
        config.export.unit_conversion
    );

    let figma = FigmaClient::with_options(
        args.figma_token.clone(),
        args.figma_api_url.clone(),
        Duration::from_secs(args.request_timeout_secs),
    )?;
    let generator = Arc::new(Generator::new(Arc::new(figma), config));

    match args.bot_token.as_deref() {
        Some(token) => start_bot(&args, token, generator.clone()).await?,
        None => info!("BOT_TOKEN not set; Telegram bot disabled"),
    }

    let state = AppState::new(generator, args.output_filename.clone());
    let app = api::router(state).layer(TraceLayer::new_for_http());

    // Start server
    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Request timeout: {}s", args.request_timeout_secs);

    axum::serve(listener, app).await?;

    Ok(())
}
