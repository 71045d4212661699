//! Projection of a panel session for the presentation layer.
//!
//! Nothing here draws anything. [`render`] only decides which of the three
//! presentations applies and hands the data over.

use serde::Serialize;

use super::types::{LoadingPhase, PanelSession};
use crate::query::{QueryResult, has_values};

/// The read view handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PanelView {
    pub tables: QueryResult,
    pub phase: LoadingPhase,
}

/// What the presentation layer should show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PanelRender {
    /// First fetch still running: show a spinner.
    Loading,
    /// No table has a data row: show an empty-state placeholder.
    Empty,
    /// Hand the view to the consumer.
    Ready(PanelView),
}

impl PanelSession {
    pub fn view(&self) -> PanelView {
        PanelView {
            tables: self.tables.clone(),
            phase: self.phase,
        }
    }
}

pub fn render(session: &PanelSession) -> PanelRender {
    if session.is_first_fetch && session.phase == LoadingPhase::Loading {
        return PanelRender::Loading;
    }

    if !has_values(&session.tables) {
        return PanelRender::Empty;
    }

    PanelRender::Ready(session.view())
}
