//! OpenAI-based nudge text generation.
//!
//! This crate provides a thin, stateless client over the OpenAI chat
//! completions API. The Winddown dispatcher hands it an instruction block,
//! the player's recent conversation history, and a nudge prompt; it hands
//! back one generated message. Conversation state lives elsewhere.
//!
//! # Example
//!
//! ```rust,no_run
//! use openai_brain::OpenAiBrain;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let brain = OpenAiBrain::from_env()?;
//!     let text = brain
//!         .generate("You are a friendly bot.", &[], "Say hello.")
//!         .await?;
//!     println!("{text}");
//!     Ok(())
//! }
//! ```

mod api_types;
mod brain;
mod config;
mod error;

pub use api_types::ChatMessage;
pub use brain::OpenAiBrain;
pub use config::{OpenAiBrainConfig, DEFAULT_PROMPT_FILE};
pub use error::BrainError;
