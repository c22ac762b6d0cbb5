//! Repository layer over the key-value persistence collaborator.
//!
//! # Responsibility
//! - Map the journal's load-all/append-one contract onto get/set calls.
//! - Keep JSON encoding details out of the service layer.
//!
//! # Invariants
//! - The full entry sequence lives under one key as a JSON array.
//! - Read paths reject invalid persisted entries instead of masking them.

pub mod entry_repo;
