//! Control-link session handling
//!
//! This module handles:
//! - Tracking the single connected drone link
//! - Driving the WebSocket read/write halves
//! - Superseding a previous link when a new drone connects

mod connection;
mod registry;

pub use connection::{run_link_session, LinkHandle};
pub use registry::LinkRegistry;
