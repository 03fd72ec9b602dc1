//! # hubdrive-app
//!
//! Application layer — the control core and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `HubMessenger` — send typed messages to one hub
//! - Turn input snapshots into port commands (`task_builder`)
//! - Coalesce redundant pending commands (`task_queue_compressor`)
//! - Hold pending commands and execution counters (`task_queue`), and drain
//!   them through a single dispatcher (`scheduler`)
//! - Track hub property subscriptions and fan decoded events out to any
//!   number of listeners (`property_feature`)
//!
//! ## Dependency rule
//! Depends on `hubdrive-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod property_feature;
pub mod scheduler;
pub mod task_builder;
pub mod task_queue;
pub mod task_queue_compressor;
