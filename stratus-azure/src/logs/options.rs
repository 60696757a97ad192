//! Query options and time spans.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Options for a single logs query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogsQueryOptions {
    /// How long the service may run the query.
    pub server_timeout: Option<Duration>,
    /// Ask for query statistics.
    pub include_statistics: bool,
    /// Ask for visualization data.
    pub include_visualization: bool,
    /// Extra workspaces the query spans.
    pub additional_workspaces: Vec<String>,
}

impl LogsQueryOptions {
    /// Options with everything off.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server timeout.
    pub fn server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = Some(timeout);
        self
    }

    /// Include query statistics.
    pub fn include_statistics(mut self, include: bool) -> Self {
        self.include_statistics = include;
        self
    }

    /// Include visualization data.
    pub fn include_visualization(mut self, include: bool) -> Self {
        self.include_visualization = include;
        self
    }

    /// Add a workspace the query also runs against.
    pub fn additional_workspace(mut self, workspace: impl Into<String>) -> Self {
        self.additional_workspaces.push(workspace.into());
        self
    }

    /// The `Prefer` header value, `None` when no directive applies.
    pub(crate) fn prefer_header(&self) -> Option<String> {
        let mut directives = Vec::new();
        if let Some(timeout) = self.server_timeout {
            directives.push(format!("wait={}", timeout.as_secs()));
        }
        if self.include_statistics {
            directives.push("include-statistics=true".to_string());
        }
        if self.include_visualization {
            directives.push("include-render=true".to_string());
        }

        (!directives.is_empty()).then(|| directives.join(","))
    }
}

/// The time range a query covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryTimeSpan {
    /// A window of the given length ending now.
    Last(Duration),
    /// Between two instants.
    Between {
        /// Start of the range.
        start: DateTime<Utc>,
        /// End of the range.
        end: DateTime<Utc>,
    },
    /// A window of the given length starting at an instant.
    Starting {
        /// Start of the range.
        start: DateTime<Utc>,
        /// Length of the range.
        duration: Duration,
    },
}

impl QueryTimeSpan {
    /// Last 5 minutes.
    pub const LAST_5_MINUTES: Self = Self::Last(Duration::from_secs(5 * 60));
    /// Last 30 minutes.
    pub const LAST_30_MINUTES: Self = Self::Last(Duration::from_secs(30 * 60));
    /// Last hour.
    pub const LAST_HOUR: Self = Self::Last(Duration::from_secs(3600));
    /// Last 4 hours.
    pub const LAST_4_HOURS: Self = Self::Last(Duration::from_secs(4 * 3600));
    /// Last 12 hours.
    pub const LAST_12_HOURS: Self = Self::Last(Duration::from_secs(12 * 3600));
    /// Last day.
    pub const LAST_DAY: Self = Self::Last(Duration::from_secs(24 * 3600));
    /// Last 2 days.
    pub const LAST_2_DAYS: Self = Self::Last(Duration::from_secs(48 * 3600));
    /// Last 7 days.
    pub const LAST_7_DAYS: Self = Self::Last(Duration::from_secs(7 * 24 * 3600));
    /// Last 30 days.
    pub const LAST_30_DAYS: Self = Self::Last(Duration::from_secs(30 * 24 * 3600));

    /// A window ending now.
    pub fn last(duration: Duration) -> Self {
        Self::Last(duration)
    }

    /// Between two instants.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::Between { start, end }
    }

    /// A window starting at an instant.
    pub fn starting(start: DateTime<Utc>, duration: Duration) -> Self {
        Self::Starting { start, duration }
    }
}

impl fmt::Display for QueryTimeSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Last(duration) => f.write_str(&iso8601_duration(*duration)),
            Self::Between { start, end } => write!(f, "{}/{}", instant(start), instant(end)),
            Self::Starting { start, duration } => {
                write!(f, "{}/{}", instant(start), iso8601_duration(*duration))
            }
        }
    }
}

fn instant(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render a duration as an ISO-8601 `PT..H..M..S` value.
fn iso8601_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);
    let millis = duration.subsec_millis();

    let mut out = String::from("PT");
    if hours > 0 {
        out.push_str(&format!("{hours}H"));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}M"));
    }
    if millis > 0 {
        let fraction = format!("{millis:03}");
        out.push_str(&format!("{seconds}.{}S", fraction.trim_end_matches('0')));
    } else if seconds > 0 || out.len() == 2 {
        out.push_str(&format!("{seconds}S"));
    }
    out
}
