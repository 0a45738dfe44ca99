//! veo-studio library crate.
//!
//! Resilient text and video generation clients plus their configuration.

pub mod config;
pub mod genai;
