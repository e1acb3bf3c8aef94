//! Short-lived messages shown to the user after an action

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::usage::{LimitError, LimitFlags};

/// Notice kind - affects duration and styling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NoticeKind {
    Success,
    Error,
    LimitWarning,
    Info,
}

impl NoticeKind {
    pub fn duration_secs(&self) -> i64 {
        match self {
            NoticeKind::Info => 3,
            NoticeKind::Success => 3,
            NoticeKind::Error => 10,
            NoticeKind::LimitWarning => 15,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            NoticeKind::Success => "ok",
            NoticeKind::Error => "error",
            NoticeKind::LimitWarning => "limit",
            NoticeKind::Info => "info",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self::at(kind, message, Utc::now())
    }

    pub fn at(kind: NoticeKind, message: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            message: message.into(),
            kind,
            created_at,
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }

    /// Error notice for a failed user action. Limit refusals become
    /// limit warnings instead.
    pub fn from_error(action: &str, err: &anyhow::Error) -> Self {
        if let Some(limit) = err.downcast_ref::<LimitError>() {
            return Self::new(NoticeKind::LimitWarning, limit.to_string());
        }
        Self::new(NoticeKind::Error, format!("{} failed: {:#}", action, err))
    }

    /// Warning for usage that is close to (or past) a limit, if any
    pub fn for_limits(flags: &LimitFlags) -> Option<Self> {
        if flags.any_exceeded() {
            Some(Self::new(
                NoticeKind::LimitWarning,
                "Usage limit reached. New AI requests are paused.",
            ))
        } else if flags.any_near() {
            Some(Self::new(
                NoticeKind::LimitWarning,
                "Approaching your usage limit.",
            ))
        } else {
            None
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.created_at + Duration::seconds(self.kind.duration_secs())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, NoticeKind::Error | NoticeKind::LimitWarning)
    }
}

/// Notices in arrival order
#[derive(Debug, Clone, Default)]
pub struct NoticeQueue {
    notices: Vec<Notice>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, notice: Notice) {
        tracing::debug!(kind = notice.kind.label(), message = %notice.message, "notice");
        self.notices.push(notice);
    }

    pub fn current(&self) -> Option<&Notice> {
        self.current_at(Utc::now())
    }

    /// Most recent notice that hasn't expired yet
    pub fn current_at(&self, now: DateTime<Utc>) -> Option<&Notice> {
        self.notices.iter().rev().find(|n| !n.is_expired_at(now))
    }

    pub fn prune(&mut self) {
        self.prune_at(Utc::now());
    }

    pub fn prune_at(&mut self, now: DateTime<Utc>) {
        self.notices.retain(|n| !n.is_expired_at(now));
    }

    /// Take everything queued so far, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn len(&self) -> usize {
        self.notices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_durations_by_kind() {
        let info = Notice::at(NoticeKind::Info, "Saved", t0());
        assert!(!info.is_expired_at(t0() + Duration::seconds(2)));
        assert!(info.is_expired_at(t0() + Duration::seconds(3)));

        let warning = Notice::at(NoticeKind::LimitWarning, "Near limit", t0());
        assert!(!warning.is_expired_at(t0() + Duration::seconds(14)));
        assert!(warning.is_error());
    }

    #[test]
    fn test_current_skips_expired() {
        let mut queue = NoticeQueue::new();
        queue.push(Notice::at(NoticeKind::Error, "Sync failed", t0()));
        queue.push(Notice::at(NoticeKind::Success, "Saved", t0()));

        let now = t0() + Duration::seconds(5);
        // The success notice is gone, the error is still showing
        assert_eq!(queue.current_at(now).unwrap().message, "Sync failed");

        queue.prune_at(now);
        assert_eq!(queue.len(), 1);
        queue.prune_at(t0() + Duration::seconds(10));
        assert!(queue.is_empty());
        assert!(queue.current_at(t0()).is_none());
    }

    #[test]
    fn test_limit_error_becomes_warning() {
        let err = anyhow::Error::new(LimitError::DailyRequests {
            used: 1000,
            limit: 1000,
        });
        let notice = Notice::from_error("Request", &err);
        assert_eq!(notice.kind, NoticeKind::LimitWarning);

        let notice = Notice::from_error("Save", &anyhow::anyhow!("disk full"));
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Save failed: disk full");
    }

    #[test]
    fn test_for_limits() {
        assert!(Notice::for_limits(&LimitFlags::default()).is_none());

        let near = LimitFlags {
            near_daily_request_limit: true,
            ..LimitFlags::default()
        };
        assert_eq!(Notice::for_limits(&near).unwrap().kind, NoticeKind::LimitWarning);
    }

    #[test]
    fn test_drain() {
        let mut queue = NoticeQueue::new();
        queue.push(Notice::info("one"));
        queue.push(Notice::info("two"));
        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].message, "one");
        assert!(queue.is_empty());
    }
}
