//! Lifecycle controller: wires the listener thread to the terminal display and
//! runs the foreground quit-key loop.

use crate::display::{RenderSink, TerminalDisplay};
use crate::error::Result;
use crate::hook::{Hook, KeyHandler};
use crate::state::KeyState;
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEventKind, KeyModifiers};
use std::sync::Arc;
use std::time::Duration;

/// Runtime settings for [`run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// How long each keystroke poll may wait before the quit flag is checked.
    pub poll_interval: Duration,
    /// Key that ends the session.
    pub quit_key: char,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            quit_key: 'q',
        }
    }
}

/// Run the display until the quit key is pressed.
///
/// Capture failures do not end the session: the terminal stays up and the
/// quit key keeps working, nothing is ever shown.
pub fn run(config: &Config) -> Result<()> {
    let state = Arc::new(KeyState::new(TerminalDisplay::new()?));
    let hook = Hook::new(state.quit_flag());
    hook.spawn(KeyHandler::new(state.clone()))?;

    let quit_key = config.quit_key;
    let result = wait_for_quit(&state, config.poll_interval, |timeout| {
        poll_quit_key(timeout, quit_key)
    });

    state.request_quit();
    let stopped = hook.stop();
    state.with_sink(TerminalDisplay::restore)?;
    stopped?;
    result
}

/// Foreground loop: poll for the quit key until it arrives or some other
/// party raises the quit flag.
///
/// `poll` waits up to the given timeout and reports whether quitting was
/// requested.
pub fn wait_for_quit<S, P>(state: &KeyState<S>, interval: Duration, mut poll: P) -> Result<()>
where
    S: RenderSink,
    P: FnMut(Duration) -> Result<bool>,
{
    while !state.should_quit() {
        if poll(interval)? {
            log::debug!("quit key pressed");
            state.request_quit();
        }
    }
    Ok(())
}

/// Wait up to `timeout` for a terminal keystroke and check it against the
/// quit key. Ctrl+C always quits, raw mode swallows the signal.
pub fn poll_quit_key(timeout: Duration, quit_key: char) -> Result<bool> {
    if !event::poll(timeout)? {
        return Ok(false);
    }

    match event::read()? {
        TermEvent::Key(key) if key.kind == KeyEventKind::Press => Ok(is_quit_key(
            key.code,
            key.modifiers,
            quit_key,
        )),
        _ => Ok(false),
    }
}

fn is_quit_key(code: KeyCode, modifiers: KeyModifiers, quit_key: char) -> bool {
    match code {
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => true,
        KeyCode::Char(c) => c.eq_ignore_ascii_case(&quit_key),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn null_state() -> KeyState<impl RenderSink> {
        KeyState::new(|_: &str| {})
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.poll_interval, Duration::from_millis(100));
        assert_eq!(config.quit_key, 'q');
    }

    #[test]
    fn test_quit_keys() {
        assert!(is_quit_key(KeyCode::Char('q'), KeyModifiers::NONE, 'q'));
        assert!(is_quit_key(KeyCode::Char('Q'), KeyModifiers::SHIFT, 'q'));
        assert!(is_quit_key(KeyCode::Char('c'), KeyModifiers::CONTROL, 'q'));
        assert!(!is_quit_key(KeyCode::Char('c'), KeyModifiers::NONE, 'q'));
        assert!(!is_quit_key(KeyCode::Esc, KeyModifiers::NONE, 'q'));
        assert!(is_quit_key(KeyCode::Char('x'), KeyModifiers::NONE, 'x'));
    }

    #[test]
    fn test_wait_for_quit_polls_until_quit_key() {
        let state = null_state();
        let mut script = vec![false, false, true].into_iter();
        let polls = Mutex::new(Vec::new());

        wait_for_quit(&state, Duration::from_millis(100), |timeout| {
            polls.lock().unwrap().push(timeout);
            Ok(script.next().unwrap_or(true))
        })
        .unwrap();

        assert!(state.should_quit());
        assert_eq!(
            *polls.lock().unwrap(),
            vec![Duration::from_millis(100); 3]
        );
    }

    #[test]
    fn test_wait_for_quit_honors_external_quit() {
        let state = null_state();
        state.request_quit();

        wait_for_quit(&state, Duration::from_millis(100), |_| {
            panic!("polled after quit was requested")
        })
        .unwrap();
    }

    #[test]
    fn test_wait_for_quit_propagates_poll_errors() {
        let state = null_state();
        let result = wait_for_quit(&state, Duration::from_millis(100), |_| {
            Err(std::io::Error::other("tty gone").into())
        });

        assert!(matches!(result, Err(crate::Error::Terminal(_))));
        assert!(!state.should_quit());
    }

    #[test]
    fn test_hook_spawn_and_stop() {
        // Whether or not capture can attach here, stopping must join cleanly.
        let state = Arc::new(null_state());
        let hook = Hook::new(state.quit_flag());
        hook.spawn(|_: &crate::Event| {}).unwrap();

        state.request_quit();
        hook.stop().unwrap();
        assert!(state.is_empty());
    }
}
