//! Integration tests for the storyteller service

mod config_integration;
mod orchestration;
