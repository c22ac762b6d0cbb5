//! Domain model for the pain journal.
//!
//! # Responsibility
//! - Define the canonical `PainEntry` record and its sparse candidate form.
//! - Own the validate -> build pipeline that is the only way to create entries.
//!
//! # Invariants
//! - An entry exists only if its candidate passed `validation::validate_candidate`.
//! - `id`/`timestamp` are assigned by `builder::EntryBuilder`, never by callers.

pub mod builder;
pub mod candidate;
pub mod entry;
pub mod validation;
