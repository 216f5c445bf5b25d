pub mod config;
pub mod logging;
pub mod ai;
pub mod live;
pub mod storage;

pub use logging::LogLevel;

use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::broadcast::error::RecvError;

use crate::ai::AIClient;
use crate::config::Config;
use crate::live::{LiveEvent, LiveSession, StreamConfig};
use crate::storage::StorageClient;

/// Validates the stream config, remembers it and builds the session.
pub fn init(
    config: &Config,
    stream: StreamConfig,
    offline: bool,
) -> Result<LiveSession, Box<dyn std::error::Error + Send + Sync>> {
    stream.validate()?;

    match StorageClient::new(&config.database_path) {
        Ok(storage) => {
            if let Err(e) = storage.save_stream_config(&stream) {
                warn!("Failed to remember stream config: {}", e);
            }
        }
        Err(e) => warn!("Storage unavailable, stream config not saved: {}", e),
    }

    let ai_client = if offline {
        info!("Offline mode: chat messages come from local fallbacks only.");
        AIClient::disabled()
    } else if config.is_anthropic_configured() {
        info!("Remote message generation enabled ({}).", config.anthropic_model);
        AIClient::from_config(config)
    } else {
        info!("No Anthropic key configured. Using local fallback messages.");
        AIClient::disabled()
    };

    Ok(LiveSession::new(stream, ai_client))
}

/// Runs the session until Ctrl+C or until `duration` has passed.
pub async fn run(
    session: LiveSession,
    duration: Option<Duration>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut events = session.subscribe();
    session.start();

    let deadline = async {
        match duration {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    println!("Live session is running. Press Ctrl+C to end the stream.");

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => log_event(&event),
                Err(RecvError::Lagged(skipped)) => warn!("Event log fell behind, skipped {} events", skipped),
                Err(RecvError::Closed) => break,
            },
            _ = &mut deadline => {
                info!("Session duration elapsed.");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, ending the stream.");
                break;
            }
        }
    }

    info!("Stream ended after {}.", session.uptime_string());
    session.shutdown();
    Ok(())
}

fn log_event(event: &LiveEvent) {
    match event {
        LiveEvent::ViewerCountChanged(count) => info!("👀 {} watching", count),
        LiveEvent::MessageGenerated(message) => info!("💬 {}: {}", message.author, message.text),
        LiveEvent::ReactionSpawned(reaction) => debug!("Reaction {} floating", reaction.emoji),
        LiveEvent::ReactionExpired(id) => debug!("Reaction {} faded", id),
    }
}
