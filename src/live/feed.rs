use std::collections::VecDeque;

use uuid::Uuid;

use super::models::{ChatMessage, ReactionType};

pub const FEED_CAPACITY: usize = 20;

/// Newest-first chat feed holding at most [`FEED_CAPACITY`] messages.
#[derive(Debug, Default)]
pub struct MessageFeed {
    messages: VecDeque<ChatMessage>,
}

impl MessageFeed {
    pub fn new() -> Self {
        Self {
            messages: VecDeque::with_capacity(FEED_CAPACITY + 1),
        }
    }

    /// Prepends a message, evicting the oldest one past capacity.
    pub fn insert_at_head(&mut self, message: ChatMessage) -> Option<ChatMessage> {
        self.messages.push_front(message);
        if self.messages.len() > FEED_CAPACITY {
            self.messages.pop_back()
        } else {
            None
        }
    }

    /// Returns the new state of the reaction, or `None` if no message has that id.
    pub fn toggle_reaction(&mut self, message_id: Uuid, reaction: ReactionType) -> Option<bool> {
        self.messages
            .iter_mut()
            .find(|message| message.id == message_id)
            .map(|message| message.toggle_reaction(reaction))
    }

    pub fn get(&self, index: usize) -> Option<&ChatMessage> {
        self.messages.get(index)
    }

    pub fn find(&self, message_id: Uuid) -> Option<&ChatMessage> {
        self.messages.iter().find(|message| message.id == message_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn to_vec(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }
}
