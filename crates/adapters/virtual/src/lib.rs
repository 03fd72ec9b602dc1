//! # hubdrive-adapter-virtual
//!
//! Virtual hub that speaks the wire protocol over an in-memory byte
//! channel, for testing and demonstration purposes.
//!
//! ## Behaviour
//!
//! | Frame | Reply |
//! |-------|-------|
//! | Property request | Current value of the property |
//! | Enable / disable updates | None; value changes are pushed while enabled |
//! | Port output command | Command feedback, port state updated |
//! | Anything else | Generic error |
//!
//! ## Dependency rule
//!
//! Depends on `hubdrive-adapter-wire` (byte channel port, codec) and
//! `hubdrive-domain` only.

mod config;
mod hub;
mod port;

pub use config::VirtualHubConfig;
pub use hub::VirtualHub;
pub use port::{PortCommand, PortState};
