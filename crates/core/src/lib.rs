//! Hospital-side donation workflow engine.
//!
//! Models the administrator's register of donation requests, donor matching
//! and donation scheduling against a remote authority. The crate owns the
//! client-side rules: entity state machines, per-hospital caches with
//! explicit invalidation, local validation before dispatch, and the
//! confirm-then-apply discipline (no local mutation until the authority has
//! confirmed).
//!
//! Layering, bottom to top:
//!
//! - [`model`] — the entities and their wire representation.
//! - [`authority`] — the [`authority::DonationAuthority`] trait, the full
//!   remote operation surface, plus an in-memory implementation.
//! - [`repositories`] and [`search`] — cached read/write paths per entity.
//! - [`coordinators`] — multi-entity operations (matching, scheduling).
//! - [`panels`] — per-surface view state for interactive frontends.

pub mod authority;
pub mod config;
pub mod coordinators;
pub mod error;
pub mod model;
pub mod panels;
pub mod repositories;
pub mod search;
pub mod session;
pub mod validation;

pub use config::{CompletionPolicy, CoreConfig, UnmatchedDonorPolicy};
pub use error::{WorkflowError, WorkflowResult};
pub use session::Session;
