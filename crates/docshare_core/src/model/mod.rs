//! Domain model for the document-sharing core.
//!
//! # Responsibility
//! - Define the records persisted by repositories and returned by services.
//! - Keep pure domain rules (levels, actions, badge thresholds, sort keys)
//!   next to the types they govern.
//!
//! # Invariants
//! - Every persisted entity is identified by an SQLite rowid (`i64`).
//! - Timestamps are Unix epoch milliseconds.

pub mod badge;
pub mod category;
pub mod comment;
pub mod document;
pub mod follow;
pub mod notification;
pub mod post;
pub mod user;
pub mod recommendation;
