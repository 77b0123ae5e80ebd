//! Windows implementation using low-level hooks.

mod listen;

pub use listen::{run_hook, stop_hook};
