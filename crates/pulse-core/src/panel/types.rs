use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::config::PanelConfig;
use crate::fetch::FetchError;
use crate::query::{Query, QueryResult, query_difference};

/// Loading state of one panel. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadingPhase {
    #[default]
    NotStarted,
    Loading,
    Done,
    Error,
}

impl LoadingPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::Loading => "loading",
            Self::Done => "done",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LoadingPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inputs a host passes on activation and on every update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelProps {
    /// Identity of the data source the queries run against.
    pub link: String,
    pub queries: Vec<Query>,
    /// Whether the panel is currently in view.
    pub visible: bool,
}

impl PanelProps {
    pub fn new(link: impl Into<String>, queries: Vec<Query>) -> Self {
        Self {
            link: link.into(),
            queries,
            visible: true,
        }
    }

    /// Props whose visibility defaults to the configured value.
    pub fn from_config(config: &PanelConfig, link: impl Into<String>, queries: Vec<Query>) -> Self {
        Self {
            visible: config.visible_by_default,
            ..Self::new(link, queries)
        }
    }

    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// State owned by one orchestrator between activation and deactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PanelSession {
    pub phase: LoadingPhase,
    /// Whether the latest fetch was the one issued on activation.
    pub is_first_fetch: bool,
    pub tables: QueryResult,
    pub link: String,
    pub queries: Vec<Query>,
    pub visible: bool,
    /// When a fetch result was last applied.
    pub last_updated: Option<DateTime<Utc>>,
    /// Message of the decode fault that moved the panel to `Error`.
    pub fault: Option<String>,
}

impl PanelSession {
    pub fn new(props: PanelProps) -> Self {
        Self {
            link: props.link,
            queries: props.queries,
            visible: props.visible,
            ..Self::default()
        }
    }

    /// What changed between the stored props and `props`.
    pub fn diff(&self, props: &PanelProps) -> PropsDiff {
        PropsDiff {
            link_changed: self.link != props.link,
            visibility_changed: self.visible != props.visible,
            query_difference: query_difference(&self.queries, &props.queries),
        }
    }

    pub(crate) fn apply_props(&mut self, props: PanelProps) {
        self.link = props.link;
        self.queries = props.queries;
        self.visible = props.visible;
    }

    /// Zero-result state for an empty query set.
    pub(crate) fn clear(&mut self) {
        self.tables.clear();
        self.phase = LoadingPhase::Done;
        self.fault = None;
    }
}

/// Result of comparing stored props with incoming ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropsDiff {
    pub link_changed: bool,
    pub visibility_changed: bool,
    /// Query texts present in only one of the two sets.
    pub query_difference: Vec<String>,
}

impl PropsDiff {
    /// Any one condition is enough to warrant a refetch.
    pub fn should_refetch(&self) -> bool {
        self.link_changed || self.visibility_changed || !self.query_difference.is_empty()
    }
}

/// How a fetch that reached completion was handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The result became the session's tables.
    Applied { generation: u64, table_count: usize },
    /// A newer fetch was issued, or the panel was deactivated, before this
    /// one settled; its result was dropped.
    Stale { generation: u64 },
    /// A request failed. The session was left as it was.
    Failed { generation: u64, error: FetchError },
}

impl FetchOutcome {
    pub fn generation(&self) -> u64 {
        match self {
            Self::Applied { generation, .. }
            | Self::Stale { generation }
            | Self::Failed { generation, .. } => *generation,
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }
}

/// Why a trigger did not start a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No session: never activated, or already deactivated.
    Inactive,
    /// The panel is out of view.
    Hidden,
    /// Incoming props match the session.
    Unchanged,
}
