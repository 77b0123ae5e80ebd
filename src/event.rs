//! Event types produced by the platform listeners.

/// The type of input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Hook has been attached and is now listening.
    HookEnabled,
    /// Hook has been detached and is no longer listening.
    HookDisabled,

    /// A key was pressed down.
    KeyPressed,
    /// A key was released.
    KeyReleased,

    /// A mouse button was pressed.
    MousePressed,
    /// A mouse button was released.
    MouseReleased,

    /// A wheel notch reported as a single event (no separate release).
    MouseWheel,
}

/// The resolved input carried by press/release/wheel events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputData {
    /// Canonical key name, never empty.
    pub name: String,
    /// The raw platform-specific code (keysym, virtual key or button number).
    pub raw_code: u32,
}

/// A complete input event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// The type of event.
    pub event_type: EventType,
    /// Resolved input, absent for hook lifecycle events.
    pub input: Option<InputData>,
}

impl Event {
    /// Create an event that carries no input.
    pub fn new(event_type: EventType) -> Self {
        Self {
            event_type,
            input: None,
        }
    }

    fn with_input(event_type: EventType, name: impl Into<String>, raw_code: u32) -> Self {
        let mut event = Self::new(event_type);
        event.input = Some(InputData {
            name: name.into(),
            raw_code,
        });
        event
    }

    /// Create a hook enabled event.
    pub fn hook_enabled() -> Self {
        Self::new(EventType::HookEnabled)
    }

    /// Create a hook disabled event.
    pub fn hook_disabled() -> Self {
        Self::new(EventType::HookDisabled)
    }

    /// Create a key pressed event.
    pub fn key_pressed(name: impl Into<String>, raw_code: u32) -> Self {
        Self::with_input(EventType::KeyPressed, name, raw_code)
    }

    /// Create a key released event.
    pub fn key_released(name: impl Into<String>, raw_code: u32) -> Self {
        Self::with_input(EventType::KeyReleased, name, raw_code)
    }

    /// Create a mouse pressed event.
    pub fn mouse_pressed(name: impl Into<String>, button: u8) -> Self {
        Self::with_input(EventType::MousePressed, name, u32::from(button))
    }

    /// Create a mouse released event.
    pub fn mouse_released(name: impl Into<String>, button: u8) -> Self {
        Self::with_input(EventType::MouseReleased, name, u32::from(button))
    }

    /// Create a mouse wheel event.
    pub fn mouse_wheel(name: impl Into<String>, button: u8) -> Self {
        Self::with_input(EventType::MouseWheel, name, u32::from(button))
    }

    /// Canonical name of the input, if this event carries one.
    pub fn name(&self) -> Option<&str> {
        self.input.as_ref().map(|input| input.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_events_carry_no_input() {
        assert_eq!(Event::hook_enabled().name(), None);
        assert_eq!(Event::hook_disabled().name(), None);
    }

    #[test]
    fn test_input_events_carry_name_and_code() {
        let key = Event::key_pressed("a", 0x61);
        assert_eq!(key.event_type, EventType::KeyPressed);
        assert_eq!(key.name(), Some("a"));

        let wheel = Event::mouse_wheel("MOUSE SCROLL UP", 4);
        assert_eq!(wheel.event_type, EventType::MouseWheel);
        assert_eq!(wheel.input.map(|i| i.raw_code), Some(4));
    }
}
