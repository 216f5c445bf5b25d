use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Feeling {
    Hungry,
    Enthusiastic,
    Questioning,
    Impressed,
    NotHappy,
    Sad,
    Excited,
    Curious,
    Bored,
    Happy,
    Confused,
    Tired,
    Inspired,
    Relaxed,
    Anxious,
    Surprised,
}

impl Feeling {
    pub const ALL: [Feeling; 16] = [
        Feeling::Hungry,
        Feeling::Enthusiastic,
        Feeling::Questioning,
        Feeling::Impressed,
        Feeling::NotHappy,
        Feeling::Sad,
        Feeling::Excited,
        Feeling::Curious,
        Feeling::Bored,
        Feeling::Happy,
        Feeling::Confused,
        Feeling::Tired,
        Feeling::Inspired,
        Feeling::Relaxed,
        Feeling::Anxious,
        Feeling::Surprised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feeling::Hungry => "hungry",
            Feeling::Enthusiastic => "enthusiastic",
            Feeling::Questioning => "questioning",
            Feeling::Impressed => "impressed",
            Feeling::NotHappy => "not happy",
            Feeling::Sad => "sad",
            Feeling::Excited => "excited",
            Feeling::Curious => "curious",
            Feeling::Bored => "bored",
            Feeling::Happy => "happy",
            Feeling::Confused => "confused",
            Feeling::Tired => "tired",
            Feeling::Inspired => "inspired",
            Feeling::Relaxed => "relaxed",
            Feeling::Anxious => "anxious",
            Feeling::Surprised => "surprised",
        }
    }
}

impl fmt::Display for Feeling {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Throwaway viewer identity shaping a single generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewerPersona {
    pub feeling: Feeling,
    pub message_length_budget: u32,
}

impl ViewerPersona {
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let feeling = *Feeling::ALL.choose(rng).unwrap_or(&Feeling::Happy);
        Self {
            feeling,
            message_length_budget: rng.gen_range(1..=20) * 10,
        }
    }
}

pub const AVATAR_COUNT: u8 = 12;

/// Opaque handle to one of the bundled profile pictures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AvatarRef(pub u8);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionType {
    Heart,
    Like,
    Clap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub avatar: AvatarRef,
    pub created_at: DateTime<Utc>,
    pub reactions: HashSet<ReactionType>,
}

impl ChatMessage {
    pub fn new(author: impl Into<String>, text: impl Into<String>, avatar: AvatarRef) -> Self {
        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            text: text.into(),
            avatar,
            created_at: Utc::now(),
            reactions: HashSet::new(),
        }
    }

    /// Flips one reaction; returns whether it is now set.
    pub fn toggle_reaction(&mut self, reaction: ReactionType) -> bool {
        if self.reactions.remove(&reaction) {
            false
        } else {
            self.reactions.insert(reaction);
            true
        }
    }

    pub fn has_reaction(&self, reaction: ReactionType) -> bool {
        self.reactions.contains(&reaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn persona_budget_is_a_multiple_of_ten_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let persona = ViewerPersona::random(&mut rng);
            assert!((10..=200).contains(&persona.message_length_budget));
            assert_eq!(persona.message_length_budget % 10, 0);
        }
    }

    #[test]
    fn persona_draws_cover_all_feelings() {
        let mut rng = StdRng::seed_from_u64(11);
        let seen: HashSet<Feeling> = (0..2000).map(|_| ViewerPersona::random(&mut rng).feeling).collect();
        assert_eq!(seen.len(), Feeling::ALL.len());
    }

    #[test]
    fn double_toggle_restores_state() {
        let mut message = ChatMessage::new("emma_smith", "hi", AvatarRef(1));
        assert!(message.toggle_reaction(ReactionType::Heart));
        assert!(message.has_reaction(ReactionType::Heart));
        assert!(!message.toggle_reaction(ReactionType::Heart));
        assert!(message.reactions.is_empty());
    }

    #[test]
    fn reactions_are_independent() {
        let mut message = ChatMessage::new("emma_smith", "hi", AvatarRef(1));
        message.toggle_reaction(ReactionType::Like);
        message.toggle_reaction(ReactionType::Heart);
        assert!(message.has_reaction(ReactionType::Like));
        assert!(!message.has_reaction(ReactionType::Clap));
        message.toggle_reaction(ReactionType::Heart);
        assert!(message.has_reaction(ReactionType::Like));
    }
}
