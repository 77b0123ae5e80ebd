//! Fallback for builds without a global input backend.

use crate::error::{Error, Result};
use crate::hook::EventHandler;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

pub fn run_hook<H: EventHandler + 'static>(_quit: &Arc<AtomicBool>, _handler: H) -> Result<()> {
    Err(Error::NotSupported(
        "no global input backend for this platform or build".into(),
    ))
}

pub fn stop_hook() -> Result<()> {
    Ok(())
}
