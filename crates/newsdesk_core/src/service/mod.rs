//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the CLI and any future HTTP layer decoupled from storage details.

pub mod assets_service;
pub mod content_service;
pub mod curation_service;
