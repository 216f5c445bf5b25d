use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::debug;
use parking_lot::Mutex;
use rand::seq::SliceRandom;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::events::LiveEvent;

pub const DEFAULT_BURST_SIZE: usize = 5;
pub const BURST_SPACING: Duration = Duration::from_millis(100);
pub const REACTION_LIFETIME: Duration = Duration::from_millis(3000);
pub const AVAILABLE_EMOJIS: &[&str] = &["❤️", "👍", "👏", "🔥", "😍", "😂", "🎉", "💯"];

const RISE_DISTANCE: f32 = 500.0;
const FINAL_SCALE: f32 = 1.2;

/// Spawn offsets for a burst: the i-th reaction appears `i * BURST_SPACING` after the tap.
pub fn burst_offsets(count: usize) -> Vec<Duration> {
    (0..count as u32).map(|i| BURST_SPACING * i).collect()
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReactionFrame {
    pub translate_y: f32,
    pub alpha: f32,
    pub scale: f32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloatingReaction {
    pub id: Uuid,
    pub emoji: String,
    pub spawned_at: DateTime<Utc>,
}

impl FloatingReaction {
    pub fn new(emoji: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            emoji: emoji.into(),
            spawned_at: Utc::now(),
        }
    }

    /// Where the reaction should be drawn `elapsed` after spawning: it floats up,
    /// fades out and grows slightly over its lifetime.
    pub fn frame(elapsed: Duration) -> ReactionFrame {
        let progress = (elapsed.as_secs_f32() / REACTION_LIFETIME.as_secs_f32()).clamp(0.0, 1.0);
        ReactionFrame {
            translate_y: -RISE_DISTANCE * progress,
            alpha: 1.0 - progress,
            scale: 1.0 + (FINAL_SCALE - 1.0) * progress,
        }
    }
}

/// Schedules floating emoji reactions; each removes itself after [`REACTION_LIFETIME`].
pub struct ReactionBurstScheduler {
    alive: Arc<Mutex<Vec<FloatingReaction>>>,
    events: broadcast::Sender<LiveEvent>,
    shutdown: CancellationToken,
}

impl ReactionBurstScheduler {
    pub fn new(events: broadcast::Sender<LiveEvent>) -> Self {
        Self {
            alive: Arc::new(Mutex::new(Vec::new())),
            events,
            shutdown: CancellationToken::new(),
        }
    }

    /// Schedules `count` reactions spaced [`BURST_SPACING`] apart and returns their offsets.
    /// Returns no offsets once the scheduler has been shut down.
    pub fn burst(&self, emoji: &str, count: usize) -> Vec<Duration> {
        if self.is_shut_down() {
            debug!("Ignoring burst of {} {}: reactions are shut down", count, emoji);
            return Vec::new();
        }
        let offsets = burst_offsets(count);
        for offset in offsets.iter().copied() {
            let alive = Arc::clone(&self.alive);
            let events = self.events.clone();
            let token = self.shutdown.clone();
            let emoji = emoji.to_string();
            tokio::spawn(async move {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(offset) => {}
                }
                let reaction = FloatingReaction::new(emoji);
                run_reaction(alive, events, token, reaction).await;
            });
        }
        debug!("Scheduled burst of {} {}", count, emoji);
        offsets
    }

    /// Spawns a single reaction right away; picks a random emoji when none is given.
    pub fn spawn(&self, emoji: Option<&str>) -> FloatingReaction {
        let emoji = emoji
            .or_else(|| AVAILABLE_EMOJIS.choose(&mut rand::thread_rng()).copied())
            .unwrap_or("❤️");
        let reaction = FloatingReaction::new(emoji);
        if self.is_shut_down() {
            debug!("Ignoring reaction {}: reactions are shut down", reaction.emoji);
            return reaction;
        }
        // Register before returning so callers see it as alive immediately.
        self.alive.lock().push(reaction.clone());
        let _ = self.events.send(LiveEvent::ReactionSpawned(reaction.clone()));

        let alive = Arc::clone(&self.alive);
        let events = self.events.clone();
        let token = self.shutdown.clone();
        let id = reaction.id;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep(REACTION_LIFETIME) => {}
            }
            expire(&alive, &events, id);
        });
        reaction
    }

    pub fn alive(&self) -> Vec<FloatingReaction> {
        self.alive.lock().clone()
    }

    pub fn alive_count(&self) -> usize {
        self.alive.lock().len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Cancels pending spawns and clears every live reaction. This is terminal:
    /// the scheduler ignores any later `burst` or `spawn`.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        self.alive.lock().clear();
    }
}

async fn run_reaction(
    alive: Arc<Mutex<Vec<FloatingReaction>>>,
    events: broadcast::Sender<LiveEvent>,
    token: CancellationToken,
    reaction: FloatingReaction,
) {
    let id = reaction.id;
    alive.lock().push(reaction.clone());
    let _ = events.send(LiveEvent::ReactionSpawned(reaction));

    tokio::select! {
        _ = token.cancelled() => {}
        _ = tokio::time::sleep(REACTION_LIFETIME) => {}
    }
    expire(&alive, &events, id);
}

fn expire(alive: &Mutex<Vec<FloatingReaction>>, events: &broadcast::Sender<LiveEvent>, id: Uuid) {
    let removed = {
        let mut alive = alive.lock();
        let before = alive.len();
        alive.retain(|reaction| reaction.id != id);
        alive.len() != before
    };
    if removed {
        let _ = events.send(LiveEvent::ReactionExpired(id));
    }
}
