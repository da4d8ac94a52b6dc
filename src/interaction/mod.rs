//! Message handling and orchestration for desk-bot.
//!
//! This module turns one inbound message into one response:
//! - Resolving bulk filter phrasings directly against the tracker
//! - Aggregating classified queries into a model context block
//! - Calling the completion model with the final prompt

pub mod aggregate;
pub mod chat_message;
