use std::sync::Arc;
use std::time::Duration;

use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

use super::events::LiveEvent;
use super::feed::MessageFeed;
use super::message_cache::MessageCache;
use super::models::{AvatarRef, ChatMessage, AVATAR_COUNT};

pub const FIRST_MESSAGE_DELAY: Duration = Duration::from_millis(1000);
pub const MESSAGE_INTERVAL: Duration = Duration::from_millis(1500);

pub const USERNAMES: &[&str] = &[
    "emma_smith", "john_doe", "sarah_j", "alex_cool",
    "fitness_freak", "travel_lover", "photo_ninja", "food_addict",
    "music_fan", "art_enthusiast", "tech_geek", "fashionista",
    "nature_explorer", "book_worm", "movie_buff", "coffee_lover",
    "marlon", "georgesdroyde",
];

pub fn pick_username<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USERNAMES.choose(rng).copied().unwrap_or("viewer")
}

pub fn pick_avatar<R: Rng + ?Sized>(rng: &mut R) -> AvatarRef {
    AvatarRef(rng.gen_range(1..=AVATAR_COUNT))
}

/// Wraps a line of text into a chat message from a random synthetic viewer.
pub fn compose_message<R: Rng + ?Sized>(text: String, rng: &mut R) -> ChatMessage {
    ChatMessage::new(pick_username(rng), text, pick_avatar(rng))
}

struct RunningTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drains the message cache into the feed on a fixed schedule.
pub struct MessageFeedScheduler {
    cache: MessageCache,
    feed: Arc<RwLock<MessageFeed>>,
    events: broadcast::Sender<LiveEvent>,
    task: Mutex<Option<RunningTask>>,
}

impl MessageFeedScheduler {
    pub fn new(cache: MessageCache, feed: Arc<RwLock<MessageFeed>>, events: broadcast::Sender<LiveEvent>) -> Self {
        Self {
            cache,
            feed,
            events,
            task: Mutex::new(None),
        }
    }

    pub fn start_generating(&self) {
        self.stop_generating();

        let token = CancellationToken::new();
        let cache = self.cache.clone();
        let feed = Arc::clone(&self.feed);
        let events = self.events.clone();
        let task_token = token.clone();

        let handle = tokio::spawn(async move {
            let mut rng = StdRng::from_entropy();
            let mut ticker = interval_at(Instant::now() + FIRST_MESSAGE_DELAY, MESSAGE_INTERVAL);
            loop {
                tokio::select! {
                    _ = task_token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if task_token.is_cancelled() {
                    break;
                }
                emit_next(&cache, &feed, &events, &mut rng);
            }
            debug!("Message generation loop exited");
        });

        *self.task.lock() = Some(RunningTask { token, handle });
        info!("Message generation started");
    }

    /// Safe to call when not running, and more than once.
    pub fn stop_generating(&self) {
        if let Some(task) = self.task.lock().take() {
            task.token.cancel();
            task.handle.abort();
            info!("Message generation stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().is_some()
    }

    /// Runs a single tick by hand.
    pub fn generate_message(&self) -> ChatMessage {
        emit_next(&self.cache, &self.feed, &self.events, &mut rand::thread_rng())
    }
}

impl Drop for MessageFeedScheduler {
    fn drop(&mut self) {
        self.stop_generating();
    }
}

fn emit_next<R: Rng + ?Sized>(
    cache: &MessageCache,
    feed: &RwLock<MessageFeed>,
    events: &broadcast::Sender<LiveEvent>,
    rng: &mut R,
) -> ChatMessage {
    let message = compose_message(cache.pop_or_fallback(), rng);
    feed.write().insert_at_head(message.clone());
    // No subscribers is fine; the feed still holds the message.
    let _ = events.send(LiveEvent::MessageGenerated(message.clone()));

    if cache.needs_refill() {
        let _ = cache.spawn_refill();
    }
    message
}
