//! Storyteller: Personalized Bedtime Stories
//!
//! Composes a story prompt from a child's profile and reading preferences, asks a
//! text-generation provider for the story, then narrates and illustrates it
//! concurrently on a best-effort basis.

pub mod cli;
pub mod composition;
pub mod config;
pub mod error;
pub mod language;
pub mod logging;
pub mod orchestrator;
pub mod provider;
pub mod server;
pub mod story;
