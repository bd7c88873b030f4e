use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use dalil::core::config;
use dalil::tui;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

#[derive(Parser)]
#[command(name = "dalil", about = "Terminal client for the Dalil legal assistant")]
struct Args {
    /// Base URL of the chat server (overrides config and DALIL_BASE_URL)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Config file to use instead of ~/.dalil/config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level written to dalil.log
    #[arg(long, default_value_t = LevelFilter::Debug)]
    log_level: LevelFilter,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - writes to dalil.log in current directory
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .build();

    if let Ok(log_file) = File::create("dalil.log") {
        let _ = WriteLogger::init(args.log_level, log_config, log_file);
    }

    let file_config = config::load_config(args.config.as_deref()).map_err(std::io::Error::other)?;
    let resolved = config::resolve(&file_config, args.base_url.as_deref());

    log::info!("Dalil starting up against {}", resolved.base_url);

    tui::run(resolved)
}
