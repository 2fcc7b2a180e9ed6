//! Short-lived memo of the last generated solution.
//!
//! The host regenerates the solution several times in quick succession;
//! identical input within the window reuses the previous output.

use std::time::{Duration, Instant};

/// How long a generated solution stays reusable.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
struct Entry {
    input: String,
    output: String,
    had_duplicates: bool,
    at: Instant,
}

#[derive(Debug, Clone)]
pub struct GenerationCache {
    window: Duration,
    entry: Option<Entry>,
}

impl Default for GenerationCache {
    fn default() -> Self {
        Self::with_window(DEBOUNCE_WINDOW)
    }
}

impl GenerationCache {
    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            entry: None,
        }
    }

    /// Previous output for byte-identical `input` generated less than one
    /// window before `now`. Runs that saw duplicate entries are never reused.
    pub fn lookup(&self, input: &str, now: Instant) -> Option<&str> {
        let entry = self.entry.as_ref()?;
        let fresh = now.saturating_duration_since(entry.at) < self.window;
        (fresh && !entry.had_duplicates && entry.input == input).then_some(entry.output.as_str())
    }

    pub fn store(&mut self, input: String, output: String, had_duplicates: bool, now: Instant) {
        self.entry = Some(Entry {
            input,
            output,
            had_duplicates,
            at: now,
        });
    }

    /// Forget the last run so the next one regenerates.
    pub fn mark_as_changed(&mut self) {
        self.entry = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_input_within_window_is_reused() {
        let mut cache = GenerationCache::default();
        let start = Instant::now();
        cache.store("in".into(), "out".into(), false, start);
        assert_eq!(cache.lookup("in", start + Duration::from_millis(100)), Some("out"));
        assert_eq!(cache.lookup("other", start), None);
    }

    #[test]
    fn entries_expire_after_the_window() {
        let mut cache = GenerationCache::with_window(Duration::from_millis(50));
        let start = Instant::now();
        cache.store("in".into(), "out".into(), false, start);
        assert_eq!(cache.lookup("in", start + Duration::from_millis(50)), None);
    }

    #[test]
    fn duplicates_bypass_the_cache() {
        let mut cache = GenerationCache::default();
        let start = Instant::now();
        cache.store("in".into(), "out".into(), true, start);
        assert_eq!(cache.lookup("in", start), None);
    }

    #[test]
    fn mark_as_changed_invalidates() {
        let mut cache = GenerationCache::default();
        let start = Instant::now();
        cache.store("in".into(), "out".into(), false, start);
        cache.mark_as_changed();
        assert_eq!(cache.lookup("in", start), None);
    }
}
