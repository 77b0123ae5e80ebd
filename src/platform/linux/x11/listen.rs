//! X11 input listening using X Input 2 device events on the root window.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::hook::EventHandler;
use crate::keymap::SpecialKeyTable;
use std::ffi::CStr;
use std::os::raw::{c_int, c_uchar};
use std::ptr::null;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use x11::xinput2;
use x11::xlib;

const FALSE: c_int = 0;

/// How long one wait on the X connection may block before the quit flag is
/// checked again (milliseconds).
const POLL_TIMEOUT_MS: c_int = 100;

/// XIMaskLen(XI_LASTEVENT)
const XI_MASK_LEN: usize = ((xinput2::XI_LASTEVENT + 7) / 8) as usize;

/// Events selected on the root window for all devices.
const SELECTED_EVENTS: [c_int; 4] = [
    xinput2::XI_KeyPress,
    xinput2::XI_KeyRelease,
    xinput2::XI_ButtonPress,
    xinput2::XI_ButtonRelease,
];

fn set_mask(mask: &mut [c_uchar], event: c_int) {
    mask[(event >> 3) as usize] |= 1 << (event & 7);
}

/// Generic keysym name, e.g. `a`, `Shift_L`, `F5`.
fn keysym_name(keysym: xlib::KeySym) -> Option<String> {
    unsafe {
        let name = xlib::XKeysymToString(keysym);
        if name.is_null() {
            return None;
        }
        Some(CStr::from_ptr(name).to_string_lossy().into_owned())
    }
}

/// Decode a device-level keycode through the keyboard mapping and resolve it.
unsafe fn resolve_keycode(
    display: *mut xlib::Display,
    table: &SpecialKeyTable,
    keycode: c_int,
) -> Option<(String, u32)> {
    let keysym = unsafe { xlib::XkbKeycodeToKeysym(display, keycode as xlib::KeyCode, 0, 0) };
    let code = keysym as u32;
    table
        .resolve_key(code, || keysym_name(keysym))
        .map(|name| (name, code))
}

/// Convert an XI2 device event to our Event type.
unsafe fn convert_event(
    display: *mut xlib::Display,
    table: &SpecialKeyTable,
    evtype: c_int,
    detail: c_int,
) -> Option<Event> {
    match evtype {
        xinput2::XI_KeyPress => unsafe { resolve_keycode(display, table, detail) }
            .map(|(name, code)| Event::key_pressed(name, code)),

        xinput2::XI_KeyRelease => unsafe { resolve_keycode(display, table, detail) }
            .map(|(name, code)| Event::key_released(name, code)),

        xinput2::XI_ButtonPress => {
            let button = detail as u8;
            Some(Event::mouse_pressed(table.resolve_button(button), button))
        }

        xinput2::XI_ButtonRelease => {
            let button = detail as u8;
            Some(Event::mouse_released(table.resolve_button(button), button))
        }

        _ => None,
    }
}

/// Block until the X connection is readable or the timeout elapses.
fn wait_readable(fd: c_int) -> Result<()> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut pfd, 1, POLL_TIMEOUT_MS) };
    if ret < 0 {
        let err = std::io::Error::last_os_error();
        if err.kind() != std::io::ErrorKind::Interrupted {
            return Err(Error::Platform(format!("poll error: {}", err)));
        }
    }
    Ok(())
}

/// Select key and button events from every device on the root window.
unsafe fn select_events(display: *mut xlib::Display) {
    let mut mask = [0 as c_uchar; XI_MASK_LEN];
    for event in SELECTED_EVENTS {
        set_mask(&mut mask, event);
    }

    let mut evmask = xinput2::XIEventMask {
        deviceid: xinput2::XIAllDevices,
        mask_len: mask.len() as c_int,
        mask: mask.as_mut_ptr(),
    };

    unsafe {
        let root = xlib::XDefaultRootWindow(display);
        xinput2::XISelectEvents(display, root, &mut evmask, 1);
        xlib::XSync(display, FALSE);
    }
}

/// Drain and dispatch every event already queued on the connection.
unsafe fn dispatch_pending<H: EventHandler>(
    display: *mut xlib::Display,
    opcode: c_int,
    table: &SpecialKeyTable,
    handler: &H,
) {
    unsafe {
        while xlib::XPending(display) > 0 {
            let mut event: xlib::XEvent = std::mem::zeroed();
            xlib::XNextEvent(display, &mut event);

            let cookie = &mut event.generic_event_cookie;
            if cookie.type_ != xlib::GenericEvent || cookie.extension != opcode {
                continue;
            }
            if xlib::XGetEventData(display, cookie) == 0 {
                continue;
            }

            #[allow(clippy::cast_ptr_alignment)]
            let xide = cookie.data as *const xinput2::XIDeviceEvent;
            if let Some(xide) = xide.as_ref()
                && let Some(event) = convert_event(display, table, cookie.evtype, xide.detail)
            {
                handler.handle_event(&event);
            }

            xlib::XFreeEventData(display, cookie);
        }
    }
}

/// Run the event hook (blocking) until `quit` is raised.
pub fn run_hook<H: EventHandler + 'static>(quit: &Arc<AtomicBool>, handler: H) -> Result<()> {
    let table = SpecialKeyTable::default();

    unsafe {
        let display = xlib::XOpenDisplay(null());
        if display.is_null() {
            return Err(Error::HookStartFailed("cannot open X display".into()));
        }

        let extension_name = c"XInputExtension";
        let (mut opcode, mut first_event, mut first_error) = (0, 0, 0);
        if xlib::XQueryExtension(
            display,
            extension_name.as_ptr(),
            &mut opcode,
            &mut first_event,
            &mut first_error,
        ) == 0
        {
            xlib::XCloseDisplay(display);
            return Err(Error::HookStartFailed(
                "X Input extension not available".into(),
            ));
        }

        let (mut major, mut minor) = (2, 0);
        if xinput2::XIQueryVersion(display, &mut major, &mut minor) != 0 {
            xlib::XCloseDisplay(display);
            return Err(Error::NotSupported(format!(
                "X Input 2.0 required, server offers {}.{}",
                major, minor
            )));
        }

        select_events(display);
        handler.handle_event(&Event::hook_enabled());

        let fd = xlib::XConnectionNumber(display);
        let mut result = Ok(());
        while !quit.load(Ordering::SeqCst) {
            dispatch_pending(display, opcode, &table, &handler);
            if let Err(e) = wait_readable(fd) {
                result = Err(e);
                break;
            }
        }

        handler.handle_event(&Event::hook_disabled());
        xlib::XCloseDisplay(display);
        result
    }
}

/// Stop the event hook.
///
/// The X11 loop never blocks longer than one poll timeout, so raising the
/// quit flag is enough; there is nothing to wake.
pub fn stop_hook() -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::UNKNOWN_MOUSE_BUTTON;
    use std::ptr::null_mut;

    fn convert_button(evtype: c_int, detail: c_int) -> Option<Event> {
        let table = SpecialKeyTable::default();
        // Button events never touch the display.
        unsafe { convert_event(null_mut(), &table, evtype, detail) }
    }

    #[test]
    fn test_button_events_decode_to_press_and_release() {
        assert_eq!(
            convert_button(xinput2::XI_ButtonPress, 2),
            Some(Event::mouse_pressed("MOUSE MIDDLE CLICK", 2))
        );
        assert_eq!(
            convert_button(xinput2::XI_ButtonRelease, 2),
            Some(Event::mouse_released("MOUSE MIDDLE CLICK", 2))
        );
        assert_eq!(
            convert_button(xinput2::XI_ButtonPress, 4),
            Some(Event::mouse_pressed("MOUSE SCROLL UP", 4))
        );
        assert_eq!(
            convert_button(xinput2::XI_ButtonRelease, 9),
            Some(Event::mouse_released(UNKNOWN_MOUSE_BUTTON, 9))
        );
    }

    #[test]
    fn test_unselected_event_types_are_ignored() {
        assert_eq!(convert_button(xinput2::XI_Motion, 0), None);
        assert_eq!(convert_button(xinput2::XI_Enter, 1), None);
    }

    #[test]
    fn test_event_mask_bits() {
        let mut mask = [0 as c_uchar; XI_MASK_LEN];
        for event in SELECTED_EVENTS {
            set_mask(&mut mask, event);
        }
        // KeyPress=2, KeyRelease=3, ButtonPress=4, ButtonRelease=5
        assert_eq!(mask[0], 0b0011_1100);
        assert!(mask[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_keysym_name() {
        assert_eq!(keysym_name(0x61), Some("a".to_string()));
        assert_eq!(keysym_name(0xffe1), Some("Shift_L".to_string()));
        assert_eq!(keysym_name(0), None);
    }
}
