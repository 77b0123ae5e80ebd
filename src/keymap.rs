//! Resolution of platform-native key and button codes to canonical key names.
//!
//! Lookup order for keys is: the special-key table first, then the platform's
//! generic symbol name. Anything that still has no name is unresolved and must
//! not touch the active-key set. Mouse buttons always resolve: codes 1-5 come
//! from the table and every other button is reported as
//! [`UNKNOWN_MOUSE_BUTTON`].

use std::collections::HashMap;

/// Label used for any mouse button outside the special-key table.
pub const UNKNOWN_MOUSE_BUTTON: &str = "Unknown Mouse Button";

/// X11 button number for a wheel notch away from the user.
pub const BUTTON_SCROLL_UP: u8 = 4;
/// X11 button number for a wheel notch toward the user.
pub const BUTTON_SCROLL_DOWN: u8 = 5;

/// Mouse buttons and wheel directions, numbered the X11 way.
const MOUSE_BUTTONS: [(u8, &str); 5] = [
    (1, "MOUSE LEFT CLICK"),
    (2, "MOUSE MIDDLE CLICK"),
    (3, "MOUSE RIGHT CLICK"),
    (BUTTON_SCROLL_UP, "MOUSE SCROLL UP"),
    (BUTTON_SCROLL_DOWN, "MOUSE SCROLL DOWN"),
];

// X11 keysyms (X11/keysymdef.h)
const XK_HOME: u32 = 0xff50;
const XK_PAGE_UP: u32 = 0xff55;
const XK_PAGE_DOWN: u32 = 0xff56;
const XK_END: u32 = 0xff57;

// Windows virtual key codes
const VK_PRIOR: u32 = 0x21;
const VK_NEXT: u32 = 0x22;
const VK_END: u32 = 0x23;
const VK_HOME: u32 = 0x24;

const X11_NAVIGATION: [(u32, &str); 4] = [
    (XK_PAGE_UP, "PAGE UP"),
    (XK_PAGE_DOWN, "PAGE DOWN"),
    (XK_HOME, "HOME"),
    (XK_END, "END"),
];

const WINDOWS_NAVIGATION: [(u32, &str); 4] = [
    (VK_PRIOR, "PAGE UP"),
    (VK_NEXT, "PAGE DOWN"),
    (VK_HOME, "HOME"),
    (VK_END, "END"),
];

/// Static lookup for keys and buttons that lack a generic textual form.
///
/// Built once when a listener starts and only read afterwards, so it needs no
/// locking.
#[derive(Debug, Clone)]
pub struct SpecialKeyTable {
    keys: HashMap<u32, &'static str>,
    buttons: HashMap<u8, &'static str>,
}

impl SpecialKeyTable {
    /// Build a table from platform-native key codes. Mouse buttons are shared
    /// by every platform.
    pub fn new(keys: &[(u32, &'static str)]) -> Self {
        Self {
            keys: keys.iter().copied().collect(),
            buttons: MOUSE_BUTTONS.iter().copied().collect(),
        }
    }

    /// Table keyed by X11 keysyms.
    pub fn x11() -> Self {
        Self::new(&X11_NAVIGATION)
    }

    /// Table keyed by Windows virtual key codes.
    pub fn windows() -> Self {
        Self::new(&WINDOWS_NAVIGATION)
    }

    /// Resolve a key code.
    ///
    /// `fallback` is the platform's generic symbol-to-string conversion and is
    /// only consulted when the table has no entry. Returns `None` when the key
    /// is unresolved.
    pub fn resolve_key<F>(&self, code: u32, fallback: F) -> Option<String>
    where
        F: FnOnce() -> Option<String>,
    {
        if let Some(name) = self.keys.get(&code) {
            return Some((*name).to_string());
        }

        match fallback() {
            Some(name) if !name.is_empty() => Some(name),
            _ => {
                log::debug!("dropping unresolved key code {:#x}", code);
                None
            }
        }
    }

    /// Resolve a mouse button or wheel direction (X11 numbering).
    pub fn resolve_button(&self, button: u8) -> &'static str {
        self.buttons
            .get(&button)
            .copied()
            .unwrap_or(UNKNOWN_MOUSE_BUTTON)
    }
}

/// The table for the platform this crate was built for.
impl Default for SpecialKeyTable {
    fn default() -> Self {
        if cfg!(target_os = "windows") {
            Self::windows()
        } else {
            Self::x11()
        }
    }
}
