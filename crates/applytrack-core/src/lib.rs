//! # applytrack-core
//!
//! Deterministic domain model for the applytrack job-application tracker.
//!
//! This crate holds everything that does not talk to a network:
//! - Application and note types as stored by the tracker
//! - Loading application/note lists from YAML or JSON files
//! - Dashboard filtering and aggregate analytics
//! - The read-time freshness policy for generated results
//!
//! AI generation, caching and persistence live in `applytrack-runtime`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use applytrack_core::{ApplicationBook, ApplicationStats, Dataset};
//!
//! let book = ApplicationBook::from_file("applications.yaml")?;
//! let stats = ApplicationStats::from_applications(&book.applications);
//! println!("response rate: {}%", stats.response_rate);
//! ```

pub mod analytics;
pub mod dataset;
pub mod filter;
pub mod staleness;
pub mod types;

pub use analytics::{ApplicationStats, MonthlyCount};
pub use dataset::{ApplicationBook, Dataset, DatasetError, NoteBook};
pub use filter::ApplicationQuery;
pub use staleness::Freshness;
pub use types::{Application, ApplicationStage, Note, UnknownStage};
