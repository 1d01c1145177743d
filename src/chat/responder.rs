//! Placeholder assistant responses.
//!
//! Stands in for model inference until a fine-tuned backend is wired up:
//! a uniform pick from a fixed list of supportive messages.

use rand::seq::IndexedRandom;

const PLACEHOLDER_RESPONSES: [&str; 3] = [
    "I understand you're reaching out for support. While I'm still being set up, \
     I want you to know that your feelings are valid and it's brave of you to seek help. \
     Once our system is fully configured, I'll be able to provide more personalized guidance.",
    "Thank you for sharing that with me. I'm currently in development mode, but I want \
     to acknowledge what you've expressed. In the meantime, if you're experiencing a crisis, \
     please reach out to a trusted adult or call a crisis helpline.",
    "I hear you, and I appreciate you opening up. My AI capabilities are still being \
     configured, but I want you to know that seeking support is an important step. \
     Remember, there are always people who care and want to help.",
];

/// Pick a placeholder response.
pub fn placeholder_response() -> &'static str {
    PLACEHOLDER_RESPONSES
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(PLACEHOLDER_RESPONSES[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_comes_from_the_fixed_list() {
        for _ in 0..20 {
            let response = placeholder_response();
            assert!(PLACEHOLDER_RESPONSES.contains(&response));
        }
    }
}
