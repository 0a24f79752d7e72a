use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use umlserve::models::AppConfig;
use umlserve::server;
use umlserve::services::{RenderService, ScratchSpace};

#[derive(Parser)]
#[command(name = "umlserve")]
#[command(about = "Render PlantUML diagrams to PNG over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Render a diagram source file directly to a PNG file
    Render {
        /// Diagram source file
        input: PathBuf,

        /// Output PNG file path (default: input with .png extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Serve) => run_server().await,
        Some(Commands::Render { input, output }) => run_render_command(&input, output).await,
        None => {
            run_status_command();
            Ok(())
        }
    }
}

/// Render a source file through the configured renderer (no server needed)
async fn run_render_command(input: &Path, output: Option<PathBuf>) -> anyhow::Result<()> {
    // Minimal logging for CLI
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umlserve=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let config = AppConfig::from_env();
    let text = std::fs::read_to_string(input)
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {e}", input.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("{} contains no diagram text", input.display());
    }

    let renderer = RenderService::new(config.renderer, ScratchSpace::new(&config.work_dir));
    let png_bytes = renderer
        .render(text.trim())
        .await
        .map_err(|e| anyhow::anyhow!("Render error: {e}"))?;

    let output = output.unwrap_or_else(|| input.with_extension("png"));
    std::fs::write(&output, &png_bytes)?;
    println!("Rendered {} ({} bytes)", output.display(), png_bytes.len());

    Ok(())
}

/// Display status and configuration information
fn run_status_command() {
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    let config = AppConfig::from_env();
    let bind_addr = std::env::var("BIND_ADDR").ok();
    let config_file = std::env::var("CONFIG_FILE").ok();

    println!("umlserve v{VERSION}");
    println!("PlantUML rendering service\n");

    println!("Environment Variables:");
    println!(
        "  BIND_ADDR   = {}",
        bind_addr.as_deref().unwrap_or("0.0.0.0:8000 (default)")
    );
    println!(
        "  CONFIG_FILE = {}",
        config_file.as_deref().unwrap_or("(not set)")
    );

    println!("\nEffective Configuration:");
    println!(
        "  Renderer:  {} {}",
        config.renderer.command,
        config.renderer.args.join(" ")
    );
    match config.renderer.timeout() {
        Some(limit) => println!("  Timeout:   {}s", limit.as_secs()),
        None => println!("  Timeout:   none"),
    }
    println!("  Save dir:  {}", config.save_dir.display());
    println!("  Work dir:  {}", config.work_dir.display());

    println!("\nCommands:");
    println!("  umlserve serve    Start the HTTP server");
    println!("  umlserve render   Render a diagram file to PNG");
    println!("\nRun 'umlserve --help' for more details.");
}

/// Run the HTTP server
async fn run_server() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "umlserve=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    tracing::info!(
        command = %config.renderer.command,
        args = ?config.renderer.args,
        timeout_secs = config.renderer.timeout_secs,
        save_dir = %config.save_dir.display(),
        work_dir = %config.work_dir.display(),
        "Renderer configured"
    );

    let state = server::create_app_state(&config)?;

    let app = server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "umlserve listening");

    axum::serve(listener, app).await?;

    Ok(())
}
