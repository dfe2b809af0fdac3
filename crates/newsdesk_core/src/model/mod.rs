//! Domain model for published content and homepage curation.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep news, gallery and video documents in one shape with a `kind` tag.
//!
//! # Invariants
//! - Every content document is identified by a stable `ContentId`.
//! - Slugs are unique per `ContentKind`, never across kinds.
//! - Curation lists only hold references; they never own content.

pub mod assets;
pub mod content;
pub mod curation;
