//! Windows input listening using SetWindowsHookEx.

use crate::error::{Error, Result};
use crate::event::Event;
use crate::hook::EventHandler;
use crate::keymap::{BUTTON_SCROLL_DOWN, BUTTON_SCROLL_UP, SpecialKeyTable};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use windows::Win32::Foundation::{LPARAM, LRESULT, WPARAM};
use windows::Win32::System::Threading::GetCurrentThreadId;
use windows::Win32::UI::Input::KeyboardAndMouse::GetKeyNameTextW;
use windows::Win32::UI::WindowsAndMessaging::{
    CallNextHookEx, GetMessageW, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, LLKHF_EXTENDED, MSG,
    MSLLHOOKSTRUCT, PostThreadMessageW, SetWindowsHookExW, UnhookWindowsHookEx, WH_KEYBOARD_LL,
    WH_MOUSE_LL, WM_KEYDOWN, WM_KEYUP, WM_LBUTTONDOWN, WM_LBUTTONUP, WM_MBUTTONDOWN,
    WM_MBUTTONUP, WM_MOUSEHWHEEL, WM_MOUSEWHEEL, WM_QUIT, WM_RBUTTONDOWN, WM_RBUTTONUP,
    WM_SYSKEYDOWN, WM_SYSKEYUP, WM_XBUTTONDOWN, WM_XBUTTONUP,
};

// Wrapper for HHOOK to make it Send + Sync
#[derive(Clone, Copy)]
struct SendableHHOOK(HHOOK);

// SAFETY: HHOOK is an opaque handle owned by the system; it is only passed
// back to the hook API, never dereferenced.
unsafe impl Send for SendableHHOOK {}
unsafe impl Sync for SendableHHOOK {}

/// X11 button numbers for inputs outside the special-key table.
const BUTTON_SCROLL_LEFT: u8 = 6;
const BUTTON_SCROLL_RIGHT: u8 = 7;
const BUTTON_BACK: u8 = 8;
const BUTTON_FORWARD: u8 = 9;

/// Handler plus the lookup table it resolves against, reachable from the
/// hook callbacks.
struct Dispatch {
    handler: Box<dyn EventHandler>,
    table: SpecialKeyTable,
}

static DISPATCH: Mutex<Option<Dispatch>> = Mutex::new(None);

/// Quit flag shared with the lifecycle controller
static QUIT_FLAG: Mutex<Option<Arc<AtomicBool>>> = Mutex::new(None);

/// Hook handles
static KEYBOARD_HOOK: Mutex<Option<SendableHHOOK>> = Mutex::new(None);
static MOUSE_HOOK: Mutex<Option<SendableHHOOK>> = Mutex::new(None);

/// Thread ID for message posting
static THREAD_ID: Mutex<u32> = Mutex::new(0);

/// Ask the hook thread's message loop to exit.
fn post_quit() {
    if let Ok(thread_id) = THREAD_ID.lock()
        && *thread_id != 0
    {
        let _ = unsafe { PostThreadMessageW(*thread_id, WM_QUIT, WPARAM(0), LPARAM(0)) };
    }
}

fn quit_requested() -> bool {
    QUIT_FLAG
        .lock()
        .ok()
        .and_then(|guard| guard.as_ref().map(|flag| flag.load(Ordering::SeqCst)))
        .unwrap_or(false)
}

/// Generic key name from the keyboard layout, e.g. `A`, `Shift`, `Num 7`.
fn key_name(kb: &KBDLLHOOKSTRUCT) -> Option<String> {
    let mut lparam = (kb.scanCode << 16) as i32;
    if kb.flags.0 & LLKHF_EXTENDED.0 != 0 {
        lparam |= 1 << 24;
    }

    let mut buffer = [0u16; 64];
    let len = unsafe { GetKeyNameTextW(lparam, &mut buffer) };
    if len <= 0 {
        return None;
    }
    Some(String::from_utf16_lossy(&buffer[..len as usize]))
}

/// High word of `MSLLHOOKSTRUCT::mouseData` (wheel delta or X button).
fn mouse_data_high(mouse: &MSLLHOOKSTRUCT) -> i16 {
    ((mouse.mouseData >> 16) & 0xFFFF) as i16
}

/// Convert a keyboard hook message to our Event type
fn convert_key_event(
    table: &SpecialKeyTable,
    message: u32,
    kb: &KBDLLHOOKSTRUCT,
) -> Option<Event> {
    let pressed = match message {
        WM_KEYDOWN | WM_SYSKEYDOWN => true,
        WM_KEYUP | WM_SYSKEYUP => false,
        _ => return None,
    };
    let name = table.resolve_key(kb.vkCode, || key_name(kb))?;
    if pressed {
        Some(Event::key_pressed(name, kb.vkCode))
    } else {
        Some(Event::key_released(name, kb.vkCode))
    }
}

/// Convert a mouse hook message to our Event type
fn convert_mouse_event(table: &SpecialKeyTable, message: u32, mouse_data: i16) -> Option<Event> {
    let pressed = |button: u8| Some(Event::mouse_pressed(table.resolve_button(button), button));
    let released = |button: u8| Some(Event::mouse_released(table.resolve_button(button), button));
    let wheel = |button: u8| Some(Event::mouse_wheel(table.resolve_button(button), button));
    let xbutton = if mouse_data == 1 { BUTTON_BACK } else { BUTTON_FORWARD };

    match message {
        WM_LBUTTONDOWN => pressed(1),
        WM_LBUTTONUP => released(1),
        WM_MBUTTONDOWN => pressed(2),
        WM_MBUTTONUP => released(2),
        WM_RBUTTONDOWN => pressed(3),
        WM_RBUTTONUP => released(3),
        WM_XBUTTONDOWN => pressed(xbutton),
        WM_XBUTTONUP => released(xbutton),

        WM_MOUSEWHEEL if mouse_data > 0 => wheel(BUTTON_SCROLL_UP),
        WM_MOUSEWHEEL => wheel(BUTTON_SCROLL_DOWN),
        WM_MOUSEHWHEEL if mouse_data > 0 => wheel(BUTTON_SCROLL_RIGHT),
        WM_MOUSEHWHEEL => wheel(BUTTON_SCROLL_LEFT),

        // Moves are not part of a combination.
        _ => None,
    }
}

/// Resolve and dispatch one hook message.
///
/// `lparam` must point to the hook struct matching `keyboard`.
unsafe fn dispatch(keyboard: bool, wparam: WPARAM, lparam: LPARAM) {
    if quit_requested() {
        post_quit();
        return;
    }

    if let Ok(guard) = DISPATCH.lock()
        && let Some(ref active) = *guard
    {
        let message = wparam.0 as u32;
        let event = if keyboard {
            let kb = unsafe { &*(lparam.0 as *const KBDLLHOOKSTRUCT) };
            convert_key_event(&active.table, message, kb)
        } else {
            let mouse = unsafe { &*(lparam.0 as *const MSLLHOOKSTRUCT) };
            convert_mouse_event(&active.table, message, mouse_data_high(mouse))
        };
        if let Some(event) = event {
            active.handler.handle_event(&event);
        }
    }
}

/// Keyboard hook callback
unsafe extern "system" fn keyboard_callback(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        unsafe { dispatch(true, wparam, lparam) };
    }

    let hook = KEYBOARD_HOOK.lock().ok().and_then(|g| g.map(|h| h.0));
    unsafe { CallNextHookEx(hook, code, wparam, lparam) }
}

/// Mouse hook callback
unsafe extern "system" fn mouse_callback(code: i32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    if code == HC_ACTION as i32 {
        unsafe { dispatch(false, wparam, lparam) };
    }

    let hook = MOUSE_HOOK.lock().ok().and_then(|g| g.map(|h| h.0));
    unsafe { CallNextHookEx(hook, code, wparam, lparam) }
}

fn unhook_all() {
    unsafe {
        if let Ok(mut kh) = KEYBOARD_HOOK.lock()
            && let Some(hook) = kh.take()
        {
            let _ = UnhookWindowsHookEx(hook.0);
        }
        if let Ok(mut mh) = MOUSE_HOOK.lock()
            && let Some(hook) = mh.take()
        {
            let _ = UnhookWindowsHookEx(hook.0);
        }
    }
}

fn clear_statics() -> Result<()> {
    *DISPATCH
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? = None;
    *QUIT_FLAG
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? = None;
    *THREAD_ID
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? = 0;
    Ok(())
}

/// Install both low-level hooks on the current thread.
fn install_hooks() -> Result<()> {
    let keyboard_hook = unsafe {
        SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_callback), None, 0)
            .map_err(|e| Error::HookStartFailed(format!("Failed to set keyboard hook: {}", e)))?
    };
    *KEYBOARD_HOOK
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? =
        Some(SendableHHOOK(keyboard_hook));

    let mouse_hook = unsafe {
        SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_callback), None, 0)
            .map_err(|e| Error::HookStartFailed(format!("Failed to set mouse hook: {}", e)))?
    };
    *MOUSE_HOOK
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? = Some(SendableHHOOK(mouse_hook));

    Ok(())
}

/// Run the event hook (blocking) until `quit` is raised.
pub fn run_hook<H: EventHandler + 'static>(quit: &Arc<AtomicBool>, handler: H) -> Result<()> {
    {
        let mut d = DISPATCH
            .lock()
            .map_err(|_| Error::ThreadError("mutex poisoned".into()))?;
        if d.is_some() {
            return Err(Error::AlreadyRunning);
        }
        *d = Some(Dispatch {
            handler: Box::new(handler),
            table: SpecialKeyTable::default(),
        });
    }
    *QUIT_FLAG
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? = Some(quit.clone());
    *THREAD_ID
        .lock()
        .map_err(|_| Error::ThreadError("mutex poisoned".into()))? =
        unsafe { GetCurrentThreadId() };

    if let Err(e) = install_hooks() {
        unhook_all();
        clear_statics()?;
        return Err(e);
    }

    if let Ok(guard) = DISPATCH.lock()
        && let Some(ref active) = *guard
    {
        active.handler.handle_event(&Event::hook_enabled());
    }

    // Message loop; hooks are serviced while GetMessageW waits.
    let mut msg = MSG::default();
    unsafe {
        while !quit.load(Ordering::SeqCst) && GetMessageW(&mut msg, None, 0, 0).as_bool() {}
    }

    if let Ok(guard) = DISPATCH.lock()
        && let Some(ref active) = *guard
    {
        active.handler.handle_event(&Event::hook_disabled());
    }

    unhook_all();
    clear_statics()
}

/// Stop the event hook by waking its message loop.
pub fn stop_hook() -> Result<()> {
    post_quit();
    Ok(())
}
