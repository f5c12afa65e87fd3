//! CLI-specific utilities for ozimap
//!
//! Argument folding and terminal progress, kept out of the library.

pub mod args;
pub mod progress;

pub use args::{ImageArgs, RegionArgs};
pub use progress::ProgressManager;
