//! # hubdrive-domain
//!
//! Pure domain model for driving a remote motorized hub.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and composite keys, error
//!   conventions, timestamps
//! - Define **Bindings** (controller inputs → hub port + command kind) and
//!   the **ControlScheme** that groups them
//! - Define **Input snapshots** and gain curves
//! - Define **Command payloads** and **Tasks** (a payload bound for a port)
//! - Define **Hub properties** and their decoded events
//! - Contain all invariant enforcement (binding limits, unique ids)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod binding;
pub mod command;
pub mod input;
pub mod limits;
pub mod message;
pub mod property;
pub mod scheme;
pub mod task;
