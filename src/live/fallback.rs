//! Local chat lines used when remote generation is off or failing.
//!
//! Rules are checked in table order and the first match wins, so every
//! location rule outranks every activity rule, which outrank purpose rules.
//! A keyword matches the start of any word, so "bak" catches "baking" but
//! "sea" leaves "research" alone.
//! When nothing matches, a line is drawn from the pool for the message mode.

use rand::seq::SliceRandom;
use rand::Rng;

use super::config::{MessageMode, StreamConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextField {
    Location,
    Activity,
    Purpose,
}

impl ContextField {
    fn value<'a>(&self, config: &'a StreamConfig) -> &'a str {
        match self {
            ContextField::Location => &config.location,
            ContextField::Activity => &config.activity_description,
            ContextField::Purpose => &config.purpose,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FallbackRule {
    pub field: ContextField,
    pub keywords: &'static [&'static str],
    pub message: &'static str,
}

impl FallbackRule {
    pub fn matches(&self, config: &StreamConfig) -> bool {
        let value = self.field.value(config).to_lowercase();
        value
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .any(|word| self.keywords.iter().any(|keyword| word.starts_with(keyword)))
    }
}

pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule { field: ContextField::Location, keywords: &["beach", "ocean", "sea"], message: "The beach looks amazing! 🌊" },
    FallbackRule { field: ContextField::Location, keywords: &["restaurant", "cafe", "diner"], message: "That food looks delicious! 😋" },
    FallbackRule { field: ContextField::Location, keywords: &["park"], message: "The park looks so peaceful! 🌳" },
    FallbackRule { field: ContextField::Location, keywords: &["forest", "mountain"], message: "The view is breathtaking! 🌲" },
    FallbackRule { field: ContextField::Location, keywords: &["home", "house", "apartment"], message: "Your place looks cozy! 🏠" },
    FallbackRule { field: ContextField::Location, keywords: &["city", "downtown", "town"], message: "I love that part of town! 🏙️" },
    FallbackRule { field: ContextField::Activity, keywords: &["cook", "bak", "chef"], message: "What ingredients are you using? 👨‍🍳" },
    FallbackRule { field: ContextField::Activity, keywords: &["travel", "explor", "tour"], message: "How's the weather there? ☀️" },
    FallbackRule { field: ContextField::Activity, keywords: &["workout", "exercise", "fitness"], message: "What's your fitness routine? 💪" },
    FallbackRule { field: ContextField::Activity, keywords: &["shop", "mall"], message: "What are you shopping for? 🛍️" },
    FallbackRule { field: ContextField::Activity, keywords: &["show"], message: "Can you show us more? 👀" },
    FallbackRule { field: ContextField::Purpose, keywords: &["tutorial", "howto", "guide"], message: "This is so helpful! 📝" },
    FallbackRule { field: ContextField::Purpose, keywords: &["vlog", "daily", "routine"], message: "I love your vlogs! 📹" },
    FallbackRule { field: ContextField::Purpose, keywords: &["music", "sing", "concert"], message: "Your voice is amazing! 🎤" },
    FallbackRule { field: ContextField::Purpose, keywords: &["game", "gaming"], message: "Nice move! 🎮" },
];

const POSITIVE_POOL: &[&str] = &[
    "This is so cool! 👏",
    "Love the content! ❤️",
    "Greetings from NYC! 👋",
    "Great stream today! 👍",
];

const QUESTION_POOL: &[&str] = &[
    "How long have you been doing this? 🤔",
    "What made you start doing this? 🤔",
    "Where are you streaming from? 📍",
    "What's next on the plan today? 👀",
];

const CUSTOM_DEFAULT: &str = "Great stream today! 👍";

pub fn matching_rule(config: &StreamConfig) -> Option<&'static FallbackRule> {
    FALLBACK_RULES.iter().find(|rule| rule.matches(config))
}

/// Lines used when no keyword rule applies.
pub fn generic_pool(config: &StreamConfig) -> Vec<String> {
    match config.message_mode {
        MessageMode::Positive => {
            let mut pool: Vec<String> = POSITIVE_POOL.iter().map(|s| s.to_string()).collect();
            let location = config.location.trim();
            if !location.is_empty() {
                pool.push(format!("Loving this view of {}! 📍", location));
            }
            pool
        }
        MessageMode::Questions => QUESTION_POOL.iter().map(|s| s.to_string()).collect(),
        MessageMode::Custom => {
            let style = config.custom_message_style.trim();
            if style.is_empty() {
                vec![CUSTOM_DEFAULT.to_string()]
            } else {
                vec![style.to_string()]
            }
        }
    }
}

/// Never empty. Deterministic whenever a keyword rule matches.
pub fn contextual_fallback<R: Rng + ?Sized>(config: &StreamConfig, rng: &mut R) -> String {
    if let Some(rule) = matching_rule(config) {
        return rule.message.to_string();
    }
    generic_pool(config)
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| CUSTOM_DEFAULT.to_string())
}

/// Initial cache contents: the first matching rule per field, or the generic pool.
pub fn seed_messages(config: &StreamConfig) -> Vec<String> {
    let seeds: Vec<String> = [ContextField::Location, ContextField::Activity, ContextField::Purpose]
        .iter()
        .filter_map(|field| {
            FALLBACK_RULES
                .iter()
                .filter(|rule| rule.field == *field)
                .find(|rule| rule.matches(config))
        })
        .map(|rule| rule.message.to_string())
        .collect();

    if seeds.is_empty() {
        generic_pool(config)
    } else {
        seeds
    }
}
