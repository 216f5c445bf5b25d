use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use parallaxlive::config::Config;
use parallaxlive::live::{MessageMode, StreamConfig};
use parallaxlive::logging::{setup_logging, LogLevel};
use parallaxlive::storage::StorageClient;
use parallaxlive::{init, run};

#[derive(Parser, Debug)]
#[command(name = "parallaxlive", about = "Simulated live stream audience", version)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, default_value = Config::CONFIG_PATH)]
    config: PathBuf,

    /// What the stream is about
    #[arg(long)]
    purpose: Option<String>,

    /// Where the stream takes place
    #[arg(long)]
    location: Option<String>,

    /// What the host is doing right now
    #[arg(long)]
    activity: Option<String>,

    /// Audience size to grow towards (at least 10)
    #[arg(long)]
    viewers: Option<u32>,

    /// positive, questions or custom
    #[arg(long)]
    mode: Option<MessageMode>,

    /// Message style used in custom mode
    #[arg(long)]
    custom_style: Option<String>,

    /// Host display name
    #[arg(long)]
    host: Option<String>,

    /// Only use local fallback messages
    #[arg(long)]
    offline: bool,

    /// End the stream after this many seconds
    #[arg(long)]
    duration: Option<u64>,

    /// Overrides the log level from the config file
    #[arg(long)]
    log_level: Option<LogLevel>,
}

impl Cli {
    fn stream_config(&self, base: StreamConfig) -> StreamConfig {
        StreamConfig {
            viewer_target: self.viewers.unwrap_or(base.viewer_target),
            message_mode: self.mode.unwrap_or(base.message_mode),
            custom_message_style: self.custom_style.clone().unwrap_or(base.custom_message_style),
            purpose: self.purpose.clone().unwrap_or(base.purpose),
            location: self.location.clone().unwrap_or(base.location),
            activity_description: self.activity.clone().unwrap_or(base.activity_description),
            host_name: self.host.clone().unwrap_or(base.host_name),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let config = if cli.offline || !std::io::stdin().is_terminal() {
        Config::load(&cli.config)?
    } else {
        Config::load_or_setup(&cli.config)?
    };
    setup_logging(cli.log_level.unwrap_or(config.log_level))?;

    let last_stream = StorageClient::new(&config.database_path)
        .ok()
        .and_then(|storage| storage.last_stream_config().ok().flatten())
        .map(|stored| stored.config)
        .unwrap_or_default();
    let stream = cli.stream_config(last_stream);

    let session = init(&config, stream, cli.offline)?;
    run(session, cli.duration.map(Duration::from_secs)).await?;

    Ok(())
}
