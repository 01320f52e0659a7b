//! Triggering events and agent session identity

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

use crate::snapshot::RefSelector;

/// What started this run. Parsed once at the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Dispatch,
    Schedule,
    Adhoc,
}

impl EventKind {
    /// Map a host event name (`GITHUB_EVENT_NAME`) onto an event kind.
    ///
    /// No event name means a direct invocation; anything else unrecognised is rejected.
    pub fn from_event_name(name: Option<&str>) -> Result<Self, String> {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => Ok(EventKind::Adhoc),
            Some("workflow_dispatch") => Ok(EventKind::Dispatch),
            Some("schedule") => Ok(EventKind::Schedule),
            Some(other) => Err(format!(
                "Unsupported event '{other}': expected workflow_dispatch or schedule"
            )),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EventKind::Dispatch => "workflow_dispatch",
            EventKind::Schedule => "schedule",
            EventKind::Adhoc => "adhoc",
        }
    }

    /// Pick the snapshot ref for this kind of event.
    ///
    /// Scheduled runs always read the default branch; the other kinds honour a
    /// triggering or requested ref when there is one.
    pub fn snapshot_ref(&self, requested: Option<&str>) -> RefSelector {
        match self {
            EventKind::Schedule => RefSelector::DefaultBranch,
            EventKind::Dispatch | EventKind::Adhoc => RefSelector::from_option(requested),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Host-provided facts used to derive a session id.
#[derive(Debug, Clone)]
pub struct EventContext {
    pub run_id: Option<String>,
    pub now: DateTime<Utc>,
}

impl EventContext {
    pub fn new(run_id: Option<String>) -> Self {
        Self { run_id: run_id.filter(|id| !id.trim().is_empty()), now: Utc::now() }
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }
}

/// Identity of one agent conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub session_id: String,
    /// Opaque handle forwarded to the agent backend; never inspected here.
    pub memory_id: Option<String>,
}

/// Derive a session id that is stable within a run and distinct across runs.
///
/// - dispatch: `workflow-<runId>`; a missing run id is an error
/// - schedule: `schedule-<digits of the ISO-8601 instant>`, with `-<runId>` appended
///   when the host provides one so same-second firings don't share a session
/// - adhoc: `session-<epoch millis>`
pub fn derive_session_id(kind: EventKind, context: &EventContext) -> Result<String, String> {
    match kind {
        EventKind::Dispatch => match &context.run_id {
            Some(run_id) => Ok(format!("workflow-{}", run_id.trim())),
            None => Err("A run id (GITHUB_RUN_ID) is required for workflow_dispatch".to_string()),
        },
        EventKind::Schedule => {
            let digits: String = context
                .now
                .to_rfc3339_opts(SecondsFormat::Millis, true)
                .chars()
                .filter(char::is_ascii_digit)
                .collect();
            Ok(match &context.run_id {
                Some(run_id) => format!("schedule-{digits}-{}", run_id.trim()),
                None => format!("schedule-{digits}"),
            })
        }
        EventKind::Adhoc => Ok(format!("session-{}", context.now.timestamp_millis())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn instant(secs: u32, millis: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 30, secs).unwrap()
            + chrono::Duration::milliseconds(i64::from(millis))
    }

    #[test]
    fn parses_host_event_names() {
        assert_eq!(EventKind::from_event_name(Some("workflow_dispatch")), Ok(EventKind::Dispatch));
        assert_eq!(EventKind::from_event_name(Some("schedule")), Ok(EventKind::Schedule));
        assert_eq!(EventKind::from_event_name(None), Ok(EventKind::Adhoc));
        assert_eq!(EventKind::from_event_name(Some("")), Ok(EventKind::Adhoc));
        assert!(EventKind::from_event_name(Some("pull_request")).is_err());
    }

    #[test]
    fn dispatch_session_is_deterministic_per_run() {
        let a = EventContext::new(Some("4242".into())).at(instant(0, 0));
        let b = EventContext::new(Some("4242".into())).at(instant(59, 999));
        let first = derive_session_id(EventKind::Dispatch, &a).unwrap();
        assert_eq!(first, "workflow-4242");
        assert_eq!(first, derive_session_id(EventKind::Dispatch, &b).unwrap());
    }

    #[test]
    fn dispatch_without_run_id_fails() {
        let ctx = EventContext::new(None);
        assert!(derive_session_id(EventKind::Dispatch, &ctx).is_err());
    }

    #[test]
    fn schedule_session_strips_non_digits() {
        let ctx = EventContext::new(None).at(instant(5, 123));
        assert_eq!(
            derive_session_id(EventKind::Schedule, &ctx).unwrap(),
            "schedule-20261016123005123"
        );
    }

    #[test]
    fn schedule_sessions_differ_across_seconds() {
        let a = derive_session_id(EventKind::Schedule, &EventContext::new(None).at(instant(1, 0)));
        let b = derive_session_id(EventKind::Schedule, &EventContext::new(None).at(instant(2, 0)));
        assert_ne!(a.unwrap(), b.unwrap());
    }

    #[test]
    fn schedule_session_includes_run_id_when_available() {
        let ctx = EventContext::new(Some("77".into())).at(instant(5, 0));
        assert_eq!(
            derive_session_id(EventKind::Schedule, &ctx).unwrap(),
            "schedule-20261016123005000-77"
        );
    }

    #[test]
    fn adhoc_session_uses_epoch_millis() {
        let now = instant(0, 250);
        let ctx = EventContext::new(None).at(now);
        assert_eq!(
            derive_session_id(EventKind::Adhoc, &ctx).unwrap(),
            format!("session-{}", now.timestamp_millis())
        );
    }

    #[test]
    fn schedule_always_reads_default_branch() {
        assert_eq!(EventKind::Schedule.snapshot_ref(Some("dev")), RefSelector::DefaultBranch);
        assert_eq!(
            EventKind::Dispatch.snapshot_ref(Some("dev")),
            RefSelector::Named("dev".to_string())
        );
    }
}
