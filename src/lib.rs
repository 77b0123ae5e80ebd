//! # keyshow
//!
//! Shows the keys and mouse buttons currently held down, centered in the
//! terminal, by listening to global input events.
//!
//! ## Backends
//!
//! - **Windows**: low-level keyboard and mouse hooks (`SetWindowsHookEx`)
//! - **Linux/X11**: X Input 2 device events on the root window (`x11` feature, default)
//!
//! Other platforms build, but capture reports itself as unsupported.
//!
//! ## Architecture
//!
//! A platform listener runs on its own thread and resolves each native code
//! to a canonical name ([`keymap`]). Presses and releases update a shared
//! [`KeyState`], which formats the held keys as `"A + B"` and hands the text
//! to a [`RenderSink`] while holding its lock. The foreground thread only
//! polls for the quit key ([`app`]).
//!
//! ```no_run
//! use keyshow::{Hook, KeyHandler, KeyState};
//! use std::sync::Arc;
//!
//! let state = Arc::new(KeyState::new(|combo: &str| println!("{combo}")));
//! let hook = Hook::new(state.quit_flag());
//! hook.spawn(KeyHandler::new(state.clone())).expect("failed to spawn listener");
//!
//! std::thread::sleep(std::time::Duration::from_secs(10));
//! hook.stop().expect("failed to stop listener");
//! ```

pub mod app;
pub mod display;
pub mod error;
pub mod event;
pub mod hook;
pub mod keymap;
pub mod state;

mod platform;

// Re-exports
pub use app::{Config, run};
pub use display::{RenderSink, TerminalDisplay};
pub use error::{Error, Result};
pub use event::{Event, EventType, InputData};
pub use hook::{EventHandler, Hook, KeyHandler};
pub use keymap::{SpecialKeyTable, UNKNOWN_MOUSE_BUTTON};
pub use state::{KeyState, SEPARATOR, format_combination};
