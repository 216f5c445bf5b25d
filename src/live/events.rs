use uuid::Uuid;

use super::models::ChatMessage;
use super::reactions::FloatingReaction;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Everything the engine tells its observers about.
#[derive(Debug, Clone)]
pub enum LiveEvent {
    ViewerCountChanged(u32),
    MessageGenerated(ChatMessage),
    ReactionSpawned(FloatingReaction),
    ReactionExpired(Uuid),
}
