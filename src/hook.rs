//! Listener thread lifecycle and the handler that feeds the key state.

use crate::display::RenderSink;
use crate::error::{Error, Result};
use crate::event::{Event, EventType};
use crate::platform;
use crate::state::KeyState;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

/// Trait for handling input events.
///
/// Platform listeners call this synchronously from their own thread for every
/// resolved press, release or wheel event.
pub trait EventHandler: Send + Sync {
    /// Called when an input event occurs.
    fn handle_event(&self, event: &Event);
}

/// Implement EventHandler for closures.
impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync,
{
    fn handle_event(&self, event: &Event) {
        self(event);
    }
}

/// Applies press/release events to a shared [`KeyState`].
pub struct KeyHandler<S> {
    state: Arc<KeyState<S>>,
}

impl<S> KeyHandler<S> {
    /// Create a handler that mutates `state`.
    pub fn new(state: Arc<KeyState<S>>) -> Self {
        Self { state }
    }
}

impl<S: RenderSink> EventHandler for KeyHandler<S> {
    fn handle_event(&self, event: &Event) {
        match event.event_type {
            EventType::HookEnabled => log::info!("input hook enabled"),
            EventType::HookDisabled => log::info!("input hook disabled"),
            EventType::KeyPressed | EventType::MousePressed => {
                if let Some(name) = event.name() {
                    self.state.add(name);
                }
            }
            EventType::KeyReleased | EventType::MouseReleased => {
                if let Some(name) = event.name() {
                    self.state.remove(name);
                }
            }
            // A notch has no release of its own: show it, then let it go.
            EventType::MouseWheel => {
                if let Some(name) = event.name() {
                    self.state.add(name);
                    self.state.remove(name);
                }
            }
        }
    }
}

/// Global input hook running on its own thread.
///
/// The hook watches a shared quit flag; [`Hook::stop`] raises it, nudges the
/// platform loop awake and joins the thread.
pub struct Hook {
    quit: Arc<AtomicBool>,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Hook {
    /// Create a hook bound to `quit`.
    pub fn new(quit: Arc<AtomicBool>) -> Self {
        Self {
            quit,
            thread_handle: Mutex::new(None),
        }
    }

    /// Listen in a background thread.
    ///
    /// Returns immediately. If the platform hook cannot attach, the failure is
    /// logged and the thread ends; nothing else is affected.
    pub fn spawn<H: EventHandler + 'static>(&self, handler: H) -> Result<()> {
        let mut slot = self
            .thread_handle
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))?;
        if slot.is_some() {
            return Err(Error::AlreadyRunning);
        }

        let quit = self.quit.clone();
        let handle = std::thread::Builder::new()
            .name("keyshow-listener".into())
            .spawn(move || {
                if let Err(e) = platform::run_hook(&quit, handler) {
                    log::error!("input capture unavailable: {}", e);
                }
            })
            .map_err(|e| Error::ThreadError(format!("failed to spawn listener: {}", e)))?;

        *slot = Some(handle);
        Ok(())
    }

    /// Stop the hook and wait for the listener thread to finish.
    pub fn stop(&self) -> Result<()> {
        let handle = self
            .thread_handle
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))?
            .take()
            .ok_or(Error::NotRunning)?;

        self.quit.store(true, Ordering::SeqCst);
        platform::stop_hook()?;

        handle
            .join()
            .map_err(|_| Error::ThreadError("failed to join hook thread".into()))
    }

    /// Check if the listener thread is still alive.
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .lock()
            .map(|slot| slot.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }
}

impl Drop for Hook {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Renders = Arc<Mutex<Vec<String>>>;

    struct Recorder(Renders);

    impl RenderSink for Recorder {
        fn render(&mut self, text: &str) -> Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    fn handler() -> (KeyHandler<Recorder>, Arc<KeyState<Recorder>>, Renders) {
        let renders: Renders = Arc::new(Mutex::new(Vec::new()));
        let state = Arc::new(KeyState::new(Recorder(renders.clone())));
        (KeyHandler::new(state.clone()), state, renders)
    }

    #[test]
    fn test_press_and_release() {
        let (handler, state, renders) = handler();

        handler.handle_event(&Event::key_pressed("a", 0x61));
        handler.handle_event(&Event::key_pressed("Shift_L", 0xffe1));
        assert_eq!(
            renders.lock().unwrap().last().cloned(),
            Some("SHIFT_L + A".to_string())
        );

        handler.handle_event(&Event::key_released("a", 0x61));
        assert_eq!(state.active_keys(), vec!["Shift_L"]);
    }

    #[test]
    fn test_mouse_buttons() {
        let (handler, state, renders) = handler();

        handler.handle_event(&Event::mouse_pressed("MOUSE MIDDLE CLICK", 2));
        assert_eq!(
            renders.lock().unwrap().last().cloned(),
            Some("MOUSE MIDDLE CLICK".to_string())
        );

        handler.handle_event(&Event::mouse_released("MOUSE MIDDLE CLICK", 2));
        assert!(state.is_empty());
    }

    #[test]
    fn test_wheel_notch_is_shown_then_released() {
        let (handler, state, renders) = handler();

        handler.handle_event(&Event::mouse_wheel("MOUSE SCROLL UP", 4));

        assert!(state.is_empty());
        assert_eq!(
            *renders.lock().unwrap(),
            vec!["MOUSE SCROLL UP".to_string()]
        );
    }

    #[test]
    fn test_lifecycle_events_leave_state_alone() {
        let (handler, state, renders) = handler();

        handler.handle_event(&Event::hook_enabled());
        handler.handle_event(&Event::hook_disabled());

        assert!(state.is_empty());
        assert!(!state.is_updated());
        assert!(renders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_closure_handler() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        let handler = move |event: &Event| log.lock().unwrap().push(event.event_type);

        handler.handle_event(&Event::key_pressed("a", 0x61));
        assert_eq!(*seen.lock().unwrap(), vec![EventType::KeyPressed]);
    }

    #[test]
    fn test_stop_without_spawn() {
        let hook = Hook::new(Arc::new(AtomicBool::new(false)));
        assert!(!hook.is_running());
        assert!(matches!(hook.stop(), Err(Error::NotRunning)));
    }
}
