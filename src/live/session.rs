use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::info;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

use super::config::StreamConfig;
use super::events::{LiveEvent, EVENT_CHANNEL_CAPACITY};
use super::feed::MessageFeed;
use super::message_cache::{MessageCache, MessageSource};
use super::message_generator::MessageFeedScheduler;
use super::models::{ChatMessage, ReactionType};
use super::reactions::{ReactionBurstScheduler, DEFAULT_BURST_SIZE};
use super::viewer_count::ViewerCountSimulator;
use crate::ai::AIClient;

/// One simulated broadcast: audience counter, chat feed and floating reactions.
///
/// The config is expected to be validated by the caller.
pub struct LiveSession {
    config: Arc<StreamConfig>,
    cache: MessageCache,
    feed: Arc<RwLock<MessageFeed>>,
    messages: MessageFeedScheduler,
    viewers: ViewerCountSimulator,
    reactions: ReactionBurstScheduler,
    events: broadcast::Sender<LiveEvent>,
    started_at: Mutex<Option<DateTime<Utc>>>,
}

impl LiveSession {
    pub fn new(config: StreamConfig, ai_client: AIClient) -> Self {
        let config = Arc::new(config);
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cache = MessageCache::new(MessageSource::new(Arc::clone(&config), ai_client));
        let feed = Arc::new(RwLock::new(MessageFeed::new()));

        Self {
            messages: MessageFeedScheduler::new(cache.clone(), Arc::clone(&feed), events.clone()),
            viewers: ViewerCountSimulator::new(config.viewer_target, events.clone()),
            reactions: ReactionBurstScheduler::new(events.clone()),
            config,
            cache,
            feed,
            events,
            started_at: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LiveEvent> {
        self.events.subscribe()
    }

    pub fn start(&self) {
        info!(
            "Going live as @{}: {} at {} ({} viewers, {} mode)",
            self.config.host_name,
            self.config.purpose,
            self.config.location,
            self.config.viewer_target,
            self.config.message_mode
        );
        let _ = self.cache.spawn_refill();
        self.messages.start_generating();
        self.viewers.start();
        *self.started_at.lock() = Some(Utc::now());
    }

    /// Stops both timers. Safe to call repeatedly or before `start`.
    pub fn stop(&self) {
        self.messages.stop_generating();
        self.viewers.stop();
        if self.started_at.lock().take().is_some() {
            info!("Live session stopped");
        }
    }

    /// Stops the session for good and discards any in-flight generation results.
    pub fn shutdown(&self) {
        self.stop();
        self.reactions.shutdown();
        self.cache.close();
    }

    pub fn is_live(&self) -> bool {
        self.messages.is_running() || self.viewers.is_running()
    }

    pub fn viewer_count(&self) -> u32 {
        self.viewers.current()
    }

    pub fn feed_snapshot(&self) -> Vec<ChatMessage> {
        self.feed.read().to_vec()
    }

    /// Returns the new state of the reaction, or `None` if the message is gone.
    pub fn toggle_reaction(&self, message_id: Uuid, reaction: ReactionType) -> Option<bool> {
        self.feed.write().toggle_reaction(message_id, reaction)
    }

    /// Floats `count` copies of `emoji`, [`DEFAULT_BURST_SIZE`] when not given.
    pub fn burst(&self, emoji: &str, count: Option<usize>) -> Vec<Duration> {
        self.reactions.burst(emoji, count.unwrap_or(DEFAULT_BURST_SIZE))
    }

    pub fn reactions(&self) -> &ReactionBurstScheduler {
        &self.reactions
    }

    pub fn uptime(&self) -> chrono::Duration {
        match *self.started_at.lock() {
            Some(started_at) => Utc::now().signed_duration_since(started_at),
            None => chrono::Duration::zero(),
        }
    }

    pub fn uptime_string(&self) -> String {
        let seconds = self.uptime().num_seconds();
        let (hours, minutes, seconds) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
        format!("{}h {}m {}s", hours, minutes, seconds)
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
