//! `TaskHUD`: timer controller for a single active task.

pub mod clock;
pub mod config;
pub mod display;
pub mod notify;
pub mod store;
pub mod timer;
