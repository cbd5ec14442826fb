//! Blockbar
//!
//! Runs user-defined commands on a fixed tick, formats their output and
//! streams it to an i3bar/swaybar compatible host. Click events from the host
//! are dispatched to per-block handler commands.

pub mod click;
pub mod config;
pub mod error;
pub mod format;
pub mod paths;
pub mod protocol;
pub mod runner;
pub mod scheduler;
pub mod symbols;

pub use config::Config;
pub use error::BarError;
pub use paths::get_config_path;
