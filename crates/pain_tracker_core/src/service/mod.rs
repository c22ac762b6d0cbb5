//! Core use-case services.
//!
//! # Responsibility
//! - Own the session record and orchestrate validation, construction,
//!   persistence and notification around it.
//! - Keep hosts decoupled from storage details.

pub mod entry_service;
pub mod persistence;
pub mod record;
