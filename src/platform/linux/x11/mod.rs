//! X11 implementation using the X Input 2 extension.

mod listen;

pub use listen::{run_hook, stop_hook};
