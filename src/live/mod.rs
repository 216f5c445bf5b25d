mod config;
mod events;
mod fallback;
mod feed;
mod message_cache;
mod message_generator;
mod models;
mod prompt;
mod reactions;
mod session;
mod viewer_count;

pub use config::{ConfigError, MessageMode, StreamConfig, MIN_VIEWER_TARGET};
pub use events::{LiveEvent, EVENT_CHANNEL_CAPACITY};
pub use fallback::{contextual_fallback, generic_pool, matching_rule, seed_messages, ContextField, FallbackRule, FALLBACK_RULES};
pub use feed::{MessageFeed, FEED_CAPACITY};
pub use message_cache::{clean_generated_text, MessageCache, MessageSource, HIGH_WATER_MARK, HISTORY_DEPTH, LOW_WATER_MARK, REFILL_BATCH_SIZE};
pub use message_generator::{compose_message, pick_avatar, pick_username, MessageFeedScheduler, FIRST_MESSAGE_DELAY, MESSAGE_INTERVAL, USERNAMES};
pub use models::{AvatarRef, ChatMessage, Feeling, ReactionType, ViewerPersona, AVATAR_COUNT};
pub use prompt::build_context_prompt;
pub use reactions::{burst_offsets, FloatingReaction, ReactionBurstScheduler, ReactionFrame, AVAILABLE_EMOJIS, BURST_SPACING, DEFAULT_BURST_SIZE, REACTION_LIFETIME};
pub use session::LiveSession;
pub use viewer_count::{ViewerCountSimulator, ViewerCountState, ViewerPhase, INITIAL_VIEWERS, PEAK_WINDOW, VIEWER_TICK};
