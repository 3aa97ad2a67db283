//! Transient notifications ("toasts") raised by the store.
//!
//! Toasts auto-dismiss after a few seconds, at most a handful are visible
//! at once, and every toast is also kept in a bounded history.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

/// Maximum number of toasts to display at once
const MAX_VISIBLE_TOASTS: usize = 3;

/// Default auto-dismiss duration in seconds
const DEFAULT_DISMISS_SECONDS: u64 = 5;

/// Maximum history entries to keep
const MAX_HISTORY_ENTRIES: usize = 100;

/// Notification level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationLevel {
    /// Get icon/prefix for this level
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationLevel::Info => "ℹ",
            NotificationLevel::Success => "✓",
            NotificationLevel::Warning => "⚠",
            NotificationLevel::Error => "✗",
        }
    }
}

/// A single toast notification
#[derive(Debug, Clone)]
pub struct Toast {
    /// Unique ID for this toast
    pub id: u64,
    pub level: NotificationLevel,
    pub message: String,
    pub created_at: Instant,
    /// How long before auto-dismiss (None = manual dismiss only)
    pub duration: Option<Duration>,
    pub dismissed: bool,
}

impl Toast {
    /// Create a new toast
    pub fn new(id: u64, level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            id,
            level,
            message: message.into(),
            created_at: Instant::now(),
            duration: Some(Duration::from_secs(DEFAULT_DISMISS_SECONDS)),
            dismissed: false,
        }
    }

    /// Check if this toast should be dismissed due to timeout
    pub fn is_expired(&self) -> bool {
        match self.duration {
            Some(duration) => self.created_at.elapsed() >= duration,
            None => false,
        }
    }

    fn is_live(&self) -> bool {
        !self.dismissed && !self.is_expired()
    }
}

impl std::fmt::Display for Toast {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level.icon(), self.message)
    }
}

/// Entry in the notification history
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Holds active toasts and their history.
#[derive(Debug)]
pub struct NotificationManager {
    /// Active toasts (newest first)
    toasts: VecDeque<Toast>,
    history: VecDeque<HistoryEntry>,
    next_id: u64,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    /// Create a new notification manager
    pub fn new() -> Self {
        Self {
            toasts: VecDeque::new(),
            history: VecDeque::new(),
            next_id: 1,
        }
    }

    /// Raise a toast. Returns its id.
    ///
    /// Dead toasts are pruned first; the queue is capped like the history.
    pub fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) -> u64 {
        self.prune();

        let toast = Toast::new(self.next_id, level, message);
        self.next_id += 1;

        self.history.push_front(HistoryEntry {
            level: toast.level,
            message: toast.message.clone(),
            timestamp: Utc::now(),
        });
        self.history.truncate(MAX_HISTORY_ENTRIES);

        let id = toast.id;
        self.toasts.push_front(toast);
        self.toasts.truncate(MAX_HISTORY_ENTRIES);
        id
    }

    /// Raise an error toast.
    pub fn error(&mut self, message: impl Into<String>) -> u64 {
        self.notify(NotificationLevel::Error, message)
    }

    /// Toasts currently on screen, newest first.
    pub fn visible(&self) -> impl Iterator<Item = &Toast> {
        self.toasts
            .iter()
            .filter(|t| t.is_live())
            .take(MAX_VISIBLE_TOASTS)
    }

    /// Number of live toasts that don't fit on screen.
    pub fn overflow_count(&self) -> usize {
        self.toasts
            .iter()
            .filter(|t| t.is_live())
            .count()
            .saturating_sub(MAX_VISIBLE_TOASTS)
    }

    /// Dismiss a toast by id. Returns whether it was found.
    pub fn dismiss(&mut self, id: u64) -> bool {
        match self.toasts.iter_mut().find(|t| t.id == id) {
            Some(toast) => {
                toast.dismissed = true;
                true
            }
            None => false,
        }
    }

    /// Drop dismissed and expired toasts.
    pub fn prune(&mut self) {
        self.toasts.retain(|t| t.is_live());
    }

    /// Every notification raised so far, newest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    /// Message of the most recent notification, if any.
    pub fn last_message(&self) -> Option<&str> {
        self.history.front().map(|h| h.message.as_str())
    }
}
