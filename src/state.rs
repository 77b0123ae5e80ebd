//! Shared key state: the active-key set, its render sink and the control flags.
//!
//! One [`KeyState`] is created by the lifecycle controller and shared through
//! an `Arc` with the listener thread. The set and the render sink sit behind a
//! single mutex, so a render always sees a complete combination and no two
//! mutations interleave.

use crate::display::RenderSink;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Separator placed between key names in a combination string.
pub const SEPARATOR: &str = " + ";

/// Join key names into a display-ready combination string.
///
/// Names are uppercased and kept in iteration order. Returns `None` for an
/// empty input, which callers treat as "nothing to draw".
pub fn format_combination<'a, I>(keys: I) -> Option<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut combination: Option<String> = None;
    for key in keys {
        let upper = key.to_uppercase();
        match combination.as_mut() {
            Some(text) => {
                text.push_str(SEPARATOR);
                text.push_str(&upper);
            }
            None => combination = Some(upper),
        }
    }
    combination
}

struct Inner<S> {
    /// Ordered set; its ascending order is the display order.
    active: BTreeSet<String>,
    sink: S,
}

/// Active-key set plus the process-wide `quit` and `updated` flags.
pub struct KeyState<S> {
    inner: Mutex<Inner<S>>,
    quit: Arc<AtomicBool>,
    updated: AtomicBool,
}

impl<S: RenderSink> KeyState<S> {
    /// Create an empty key state that renders into `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                active: BTreeSet::new(),
                sink,
            }),
            quit: Arc::new(AtomicBool::new(false)),
            updated: AtomicBool::new(false),
        }
    }

    // A panic inside a sink must not wedge the listener; the set itself is
    // never left half-updated.
    fn lock(&self) -> MutexGuard<'_, Inner<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Mark `name` as held and redraw.
    pub fn add(&self, name: &str) {
        if name.is_empty() {
            log::debug!("ignoring empty key name");
            return;
        }

        let mut inner = self.lock();
        inner.active.insert(name.to_string());
        self.recompute(&mut inner);
    }

    /// Mark `name` as released and redraw.
    pub fn remove(&self, name: &str) {
        let mut inner = self.lock();
        inner.active.remove(name);
        self.recompute(&mut inner);
    }

    /// Forget every held key without redrawing.
    pub fn clear(&self) {
        self.lock().active.clear();
    }

    fn recompute(&self, inner: &mut Inner<S>) {
        if let Some(text) = format_combination(&inner.active)
            && let Err(e) = inner.sink.render(&text)
        {
            log::warn!("failed to render {:?}: {}", text, e);
        }
        self.updated.store(true, Ordering::SeqCst);
    }

    /// Snapshot of the held keys in display order.
    pub fn active_keys(&self) -> Vec<String> {
        self.lock().active.iter().cloned().collect()
    }

    /// The combination string for the current set, if any key is held.
    pub fn combination(&self) -> Option<String> {
        format_combination(&self.lock().active)
    }

    /// Check whether no key is held.
    pub fn is_empty(&self) -> bool {
        self.lock().active.is_empty()
    }

    /// Run `f` with exclusive access to the render sink.
    pub fn with_sink<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.lock().sink)
    }
}

impl<S> KeyState<S> {
    /// Shared handle to the quit flag, for the listener thread.
    pub fn quit_flag(&self) -> Arc<AtomicBool> {
        self.quit.clone()
    }

    /// Ask every loop watching the quit flag to stop. Irreversible.
    pub fn request_quit(&self) {
        self.quit.store(true, Ordering::SeqCst);
    }

    /// Check if quitting has been requested.
    pub fn should_quit(&self) -> bool {
        self.quit.load(Ordering::SeqCst)
    }

    /// Check whether a recompute happened since the flag was last taken.
    pub fn is_updated(&self) -> bool {
        self.updated.load(Ordering::SeqCst)
    }

    /// Read and reset the `updated` flag.
    pub fn take_updated(&self) -> bool {
        self.updated.swap(false, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    type Renders = Arc<Mutex<Vec<String>>>;

    fn recording_state() -> (KeyState<impl RenderSink>, Renders) {
        let renders: Renders = Arc::new(Mutex::new(Vec::new()));
        let log = renders.clone();
        let state = KeyState::new(move |text: &str| log.lock().unwrap().push(text.to_string()));
        (state, renders)
    }

    fn last_render(renders: &Renders) -> Option<String> {
        renders.lock().unwrap().last().cloned()
    }

    #[test]
    fn test_format_combination() {
        let keys: BTreeSet<String> = ["b", "Control_L", "a"]
            .iter()
            .map(|k| k.to_string())
            .collect();
        assert_eq!(
            format_combination(&keys),
            Some("CONTROL_L + A + B".to_string())
        );
        assert_eq!(format_combination(&BTreeSet::<String>::new()), None);
    }

    #[test]
    fn test_single_key() {
        let (state, renders) = recording_state();
        state.add("A");
        assert_eq!(last_render(&renders), Some("A".to_string()));
        assert_eq!(state.combination(), Some("A".to_string()));
    }

    #[test]
    fn test_combination_uses_set_order() {
        let (state, renders) = recording_state();
        state.add("B");
        state.add("A");
        assert_eq!(last_render(&renders), Some("A + B".to_string()));

        let (state, renders) = recording_state();
        state.add("A");
        state.add("B");
        assert_eq!(last_render(&renders), Some("A + B".to_string()));
    }

    #[test]
    fn test_release_to_empty_does_not_render() {
        let (state, renders) = recording_state();
        state.add("A");
        state.remove("A");

        assert!(state.is_empty());
        assert_eq!(*renders.lock().unwrap(), vec!["A".to_string()]);
    }

    #[test]
    fn test_lowercase_names_are_uppercased() {
        let (state, renders) = recording_state();
        state.add("Page_Up");
        state.add("a");
        assert_eq!(last_render(&renders), Some("PAGE_UP + A".to_string()));
        assert_eq!(state.active_keys(), vec!["Page_Up", "a"]);
    }

    #[test]
    fn test_press_is_idempotent() {
        let (state, renders) = recording_state();
        state.add("A");
        state.add("A");
        assert_eq!(state.active_keys(), vec!["A"]);
        assert_eq!(*renders.lock().unwrap(), vec!["A", "A"]);
    }

    #[test]
    fn test_release_of_up_key_is_noop() {
        let (state, renders) = recording_state();
        state.add("A");
        state.remove("B");
        assert_eq!(state.active_keys(), vec!["A"]);
        assert_eq!(last_render(&renders), Some("A".to_string()));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let (state, renders) = recording_state();
        state.add("");
        assert!(state.is_empty());
        assert!(renders.lock().unwrap().is_empty());
    }

    #[test]
    fn test_clear_does_not_redraw() {
        let (state, renders) = recording_state();
        state.add("A");
        state.add("B");
        let before = renders.lock().unwrap().len();

        state.clear();

        assert!(state.is_empty());
        assert!(state.active_keys().is_empty());
        assert_eq!(renders.lock().unwrap().len(), before);
    }

    #[test]
    fn test_final_state_is_order_independent() {
        let presses = ["A", "B", "C", "D"];
        let releases = ["B", "D"];

        let (forward, _) = recording_state();
        for key in presses {
            forward.add(key);
        }
        for key in releases {
            forward.remove(key);
        }

        let (backward, _) = recording_state();
        backward.add("D");
        backward.add("C");
        backward.remove("D");
        backward.add("B");
        backward.add("A");
        backward.remove("B");

        assert_eq!(forward.active_keys(), vec!["A", "C"]);
        assert_eq!(forward.active_keys(), backward.active_keys());
        assert_eq!(forward.combination(), backward.combination());
    }

    #[test]
    fn test_updated_flag() {
        let (state, _renders) = recording_state();
        assert!(!state.is_updated());

        state.add("A");
        assert!(state.take_updated());
        assert!(!state.is_updated());

        // A recompute that finds the set empty still counts.
        state.remove("A");
        assert!(state.take_updated());

        state.clear();
        assert!(!state.is_updated());
    }

    #[test]
    fn test_quit_flag_is_shared() {
        let (state, _renders) = recording_state();
        let flag = state.quit_flag();
        assert!(!state.should_quit());

        state.request_quit();
        assert!(flag.load(Ordering::SeqCst));
        assert!(state.should_quit());
    }

    #[test]
    fn test_render_failure_is_swallowed() {
        struct FailingSink;

        impl RenderSink for FailingSink {
            fn render(&mut self, _text: &str) -> crate::Result<()> {
                Err(crate::Error::Platform("screen too small".into()))
            }
        }

        let state = KeyState::new(FailingSink);
        state.add("A");
        assert_eq!(state.active_keys(), vec!["A"]);
        assert!(state.is_updated());
    }

    #[test]
    fn test_renders_are_never_torn() {
        let state = Arc::new(KeyState::new(|text: &str| {
            // Every render comes from a complete snapshot: one or both keys.
            assert!(matches!(text, "X" | "Y" | "X + Y"), "torn render: {text}");
        }));

        let handles: Vec<_> = ["X", "Y"]
            .into_iter()
            .map(|key| {
                let state = state.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        state.add(key);
                        state.remove(key);
                    }
                    state.add(key);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(state.active_keys(), vec!["X", "Y"]);
        assert_eq!(state.combination(), Some("X + Y".to_string()));
    }
}
