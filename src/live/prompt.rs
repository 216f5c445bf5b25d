use super::config::{MessageMode, StreamConfig};
use super::models::ViewerPersona;

fn mode_instruction(config: &StreamConfig) -> String {
    match config.message_mode {
        MessageMode::Positive => "Generate a short, positive comment for a social media livestream.".to_string(),
        MessageMode::Questions => "Generate a short question for a social media livestream.".to_string(),
        MessageMode::Custom => format!(
            "Generate a short social media comment in this style: {}.",
            config.custom_message_style.trim()
        ),
    }
}

/// `history` is newest first.
pub fn build_context_prompt(config: &StreamConfig, persona: &ViewerPersona, history: &[String]) -> String {
    let history_block = if history.is_empty() {
        "- You are the first one to comment".to_string()
    } else {
        history.iter()
            .map(|line| format!("- {}", line))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "## Context:\n\
         You're a viewer feeling \"{feeling}\".\n\
         Your goal is to send a message to the livestreamer and get a reaction from them or from other viewers.\n\
         Base your message on the chat history.\n\
         \n\
         ## Stream Context:\n\
         - The livestreamer name: @{host}\n\
         - The livestreamer is doing: {purpose}\n\
         - Current location: {location}\n\
         - Current activity: {activity}\n\
         - Current viewers count on the live: {viewers}\n\
         \n\
         ## Stream Messages History (newest first):\n\
         {history_block}\n\
         \n\
         ## Instructions\n\
         {instruction}\n\
         Make the message sound authentic and relevant to the context. Keep it under {budget} characters. \
         Make sure it sounds like a human chatting on a livestream.\n\
         Your message can include tags or emojis.\n\
         \n\
         Only generate the message text, nothing else.",
        feeling = persona.feeling,
        host = config.host_name,
        purpose = config.purpose,
        location = config.location,
        activity = config.activity_description,
        viewers = config.viewer_target,
        history_block = history_block,
        instruction = mode_instruction(config),
        budget = persona.message_length_budget,
    )
}
