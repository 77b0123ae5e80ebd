//! Linux platform implementation.
//!
//! The `x11` feature (default) listens through the X Input 2 extension. Without
//! it the stub backend is used and capture reports itself unsupported.

#[cfg(feature = "x11")]
mod x11;
#[cfg(feature = "x11")]
pub use x11::*;

#[cfg(not(feature = "x11"))]
#[path = "../stub.rs"]
mod stub;
#[cfg(not(feature = "x11"))]
pub use stub::*;
