//! External collaborators of the bridge
//!
//! This module handles:
//! - Assembling command payloads from the database REST service
//! - Notifying downstream systems about status changes and completion

mod command_data;
mod notifier;
mod traits;

pub use command_data::ApexCommandData;
pub use notifier::HttpNotifier;
pub use traits::{CommandDataSource, NotificationSink};
