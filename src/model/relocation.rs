//! Relocation of windows that a trigger process opens away from the desktop
//! the user was on.
//!
//! When a window of a trigger process gains focus on a desktop other than the
//! current one, the tracker arms with the current desktop as the source. If
//! the host then follows that window to its desktop and a *different* window
//! of the process gains focus there, that window is the newly opened one and
//! is sent back to the source desktop. Focus events for the trigger itself,
//! or for a placeholder window that is still becoming the trigger, only keep
//! the record alive.

use std::fmt;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::sys::window::WindowId;

pub const DEFAULT_PLACEHOLDER_PATTERN: &str = "^Opening - (?P<title>.*)$";

static DEFAULT_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(DEFAULT_PLACEHOLDER_PATTERN).expect("DEFAULT_PLACEHOLDER_PATTERN is a valid static regex")
});

/// Decides whether a focused window is a transient stand-in for the trigger
/// window rather than a genuinely new window.
pub trait PlaceholderMatcher: Send + Sync + fmt::Debug {
    fn is_placeholder(&self, candidate_title: &str, trigger_title: &str) -> bool;
}

/// Matches candidate titles against a regex whose `title` group must equal
/// the trigger's title.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    pattern: Regex,
}

impl PatternMatcher {
    pub fn new(pattern: &str) -> Result<PatternMatcher, regex::Error> {
        Ok(PatternMatcher { pattern: Regex::new(pattern)? })
    }
}

impl Default for PatternMatcher {
    fn default() -> Self { PatternMatcher { pattern: DEFAULT_PLACEHOLDER.clone() } }
}

impl PlaceholderMatcher for PatternMatcher {
    fn is_placeholder(&self, candidate_title: &str, trigger_title: &str) -> bool {
        self.pattern
            .captures(candidate_title)
            .and_then(|caps| caps.name("title"))
            .is_some_and(|title| title.as_str() == trigger_title)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingRelocation {
    pub trigger: WindowId,
    pub source: usize,
    pub since: Instant,
}

impl PendingRelocation {
    pub fn is_stale(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.since) > timeout
    }
}

/// A focus event for a window owned by a trigger process.
#[derive(Debug, Clone, Copy)]
pub struct TriggerSighting {
    pub window: WindowId,
    pub window_desktop: usize,
    pub current: usize,
    pub now: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelocationStep {
    /// A new pending record was opened; the event is consumed.
    Armed { source: usize, opened_on: usize },
    /// The trigger (or its placeholder) showed up again; the event is consumed.
    Refreshed,
    /// `window` has to be moved to `target`; the record is already cleared.
    Relocate { window: WindowId, target: usize },
    /// The record went stale or the user is back on its source desktop; it
    /// was dropped and the event continues normally.
    Expired,
    /// Nothing to do here; the event continues normally.
    Continue,
}

impl RelocationStep {
    pub fn consumes_event(self) -> bool {
        matches!(
            self,
            RelocationStep::Armed { .. } | RelocationStep::Refreshed | RelocationStep::Relocate { .. }
        )
    }
}

/// At most one pending relocation; idle when `pending` is `None`.
#[derive(Debug, Default, Clone)]
pub struct RelocationTracker {
    pending: Option<PendingRelocation>,
}

impl RelocationTracker {
    pub fn pending(&self) -> Option<&PendingRelocation> { self.pending.as_ref() }

    /// The pending record unless it has gone stale.
    pub fn live(&self, now: Instant, timeout: Duration) -> Option<&PendingRelocation> {
        self.pending.as_ref().filter(|p| !p.is_stale(now, timeout))
    }

    pub fn clear(&mut self) { self.pending = None; }

    /// Advances the state machine for one sighting.
    ///
    /// `is_successor` is only consulted when the sighted window is not the
    /// trigger itself; it receives the trigger window.
    pub fn observe(
        &mut self,
        sighting: TriggerSighting,
        timeout: Duration,
        is_successor: impl FnOnce(WindowId) -> bool,
    ) -> RelocationStep {
        let TriggerSighting { window, window_desktop, current, now } = sighting;

        if window_desktop != current {
            self.pending = Some(PendingRelocation { trigger: window, source: current, since: now });
            return RelocationStep::Armed { source: current, opened_on: window_desktop };
        }

        let Some(pending) = self.pending.as_mut() else {
            return RelocationStep::Continue;
        };

        if pending.is_stale(now, timeout) {
            debug!(age = ?now.saturating_duration_since(pending.since), "Relocation timed out");
            self.pending = None;
            return RelocationStep::Expired;
        }

        // The user is back where the record was opened; nothing to send back.
        if pending.source == current {
            debug!(source = current, "Relocation dropped on its source desktop");
            self.pending = None;
            return RelocationStep::Expired;
        }

        if window == pending.trigger || is_successor(pending.trigger) {
            pending.since = now;
            return RelocationStep::Refreshed;
        }

        let target = pending.source;
        self.pending = None;
        RelocationStep::Relocate { window, target }
    }
}
