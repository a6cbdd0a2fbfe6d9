//! Configuration for sitevault
//!
//! Process configuration is read once at startup into an immutable
//! [`Settings`] value and passed explicitly into the orchestrators.

pub mod layout;
pub mod settings;

pub use layout::Layout;
pub use settings::{Destination, Settings};
