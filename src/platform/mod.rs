//! Platform-specific event sources.
//!
//! Every backend exposes the same pair of functions:
//! `run_hook(quit, handler)` blocks until `quit` is raised (or attaching
//! fails), and `stop_hook()` wakes a blocked listener so it notices the flag.

#[cfg(target_os = "windows")]
mod windows;
#[cfg(target_os = "windows")]
pub use windows::*;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "linux")]
pub use linux::*;

// Anything else builds, but capture reports itself unavailable.
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
mod stub;
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub use stub::*;
