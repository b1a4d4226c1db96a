//! Instruction prompt assembly for the message generator.

/// Base instructions handed to the generator with every nudge. `{game}` and
/// `{user_context}` are filled in per request.
const CORE_CONTEXT: &str = "\
You are a chat bot that encourages people to moderate how much they play {game}.

# Your goal

You will periodically send messages to players when they've been playing {game} \
for a long time, or late at night, encouraging them to take a break, or perhaps \
stop playing entirely for the evening. You can also talk to them when they have \
finally stopped playing. You can engage the player in discussions about {game}, \
but nothing else.

# Your tone

Your tone is informal and chatty, fitting a gaming server. Your message tone \
should be understated, but cheeky, funny, or even sarcastic.

You should keep your messages succinct, and never more than a sentence or two. \
You should reject messages designed to produce long responses.

## The player

{user_context}";

/// A one-line description of the player for the instruction block. Nudges
/// only go to open sessions, so the player is always mid-game.
pub fn user_context(handle: &str, game: &str) -> String {
    format!("The player's handle is {handle}. They are currently playing {game}. ")
}

/// Fill in the base instructions for one request.
pub fn instructions(game: &str, user_context: &str) -> String {
    CORE_CONTEXT
        .replace("{game}", game)
        .replace("{user_context}", user_context)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_context() {
        assert_eq!(
            user_context("alice", "Factorio"),
            "The player's handle is alice. They are currently playing Factorio. "
        );
    }

    #[test]
    fn test_instructions_fill_placeholders() {
        let filled = instructions("Factorio", "The player's handle is alice. ");
        assert!(filled.contains("how much they play Factorio"));
        assert!(filled.contains("The player's handle is alice. "));
        assert!(!filled.contains("{game}"));
        assert!(!filled.contains("{user_context}"));
    }
}
