//! Per-panel fetch orchestration.
//!
//! A [`QueryOrchestrator`] owns one [`PanelSession`] between `activate` and
//! `deactivate`. Every trigger (activation, prop change, clock tick, manual
//! refresh) runs the same synchronous decision under the session lock and,
//! if a fetch is warranted, spawns it on the runtime. Each fetch is tagged
//! with a generation; only a completion carrying the latest generation may
//! touch the session, so overlapping fetches can settle in any order.
//!
//! A failed request is logged and leaves the session untouched, including a
//! `Loading` phase. The next trigger retries.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::boundary::with_error_boundary;
use super::errors::PanelError;
use super::render::{PanelRender, render};
use super::types::{FetchOutcome, LoadingPhase, PanelProps, PanelSession, SkipReason};
use crate::clock::{RefreshClock, SubscriptionId};
use crate::fetch::{FetchError, QueryExecutor, ResponseDecoder, decode_all, execute_all};
use crate::query::RawResponse;
use crate::report::{ErrorReport, ErrorReporter, TracingReporter};

/// What a trigger did.
#[derive(Debug)]
pub enum FetchDispatch {
    /// No fetch was started and the session was not changed.
    Skipped(SkipReason),
    /// The query set is empty: the session went straight to `Done` with no
    /// tables and no request was made.
    Cleared,
    /// A fetch was started.
    Issued(PendingFetch),
}

impl FetchDispatch {
    pub fn is_issued(&self) -> bool {
        matches!(self, Self::Issued(_))
    }

    pub fn into_pending(self) -> Option<PendingFetch> {
        match self {
            Self::Issued(pending) => Some(pending),
            _ => None,
        }
    }
}

/// A fetch in flight. Dropping it does not cancel the fetch.
#[derive(Debug)]
pub struct PendingFetch {
    panel: String,
    generation: u64,
    handle: JoinHandle<Result<FetchOutcome, PanelError>>,
}

impl PendingFetch {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Wait for the fetch to settle.
    ///
    /// # Errors
    ///
    /// `DecodeFault` when the responses could not be decoded (the session
    /// is then in `Error`), `TaskFailed` if the task was aborted or panicked.
    pub async fn outcome(self) -> Result<FetchOutcome, PanelError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(PanelError::TaskFailed {
                panel: self.panel,
                message: e.to_string(),
            }),
        }
    }
}

struct PanelState {
    session: Option<PanelSession>,
    subscription: Option<SubscriptionId>,
    /// Generation of the most recently issued fetch. Bumped without a fetch
    /// whenever in-flight results must be invalidated.
    latest_generation: u64,
}

struct Inner {
    panel_id: String,
    clock: Arc<RefreshClock>,
    executor: Arc<dyn QueryExecutor>,
    decoder: Arc<dyn ResponseDecoder>,
    reporter: Arc<dyn ErrorReporter>,
    runtime: Handle,
    state: Mutex<PanelState>,
    session_tx: watch::Sender<PanelSession>,
}

/// Builder for [`QueryOrchestrator`].
pub struct OrchestratorBuilder {
    panel_id: String,
    clock: Arc<RefreshClock>,
    executor: Arc<dyn QueryExecutor>,
    decoder: Arc<dyn ResponseDecoder>,
    reporter: Arc<dyn ErrorReporter>,
    runtime: Option<Handle>,
}

impl OrchestratorBuilder {
    /// Where activation faults and decode faults are reported.
    /// Defaults to [`TracingReporter`].
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Runtime that fetches are spawned on. Defaults to the current one.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// # Errors
    ///
    /// `NoRuntime` when no runtime was given and none is current.
    pub fn build(self) -> Result<QueryOrchestrator, PanelError> {
        let runtime = match self.runtime {
            Some(runtime) => runtime,
            None => Handle::try_current().map_err(|_| PanelError::NoRuntime)?,
        };
        let (session_tx, _) = watch::channel(PanelSession::default());

        Ok(QueryOrchestrator {
            inner: Arc::new(Inner {
                panel_id: self.panel_id,
                clock: self.clock,
                executor: self.executor,
                decoder: self.decoder,
                reporter: self.reporter,
                runtime,
                state: Mutex::new(PanelState {
                    session: None,
                    subscription: None,
                    latest_generation: 0,
                }),
                session_tx,
            }),
        })
    }
}

/// Keeps one panel's tables in sync with its props and the refresh clock.
pub struct QueryOrchestrator {
    inner: Arc<Inner>,
}

impl QueryOrchestrator {
    pub fn builder(
        panel_id: impl Into<String>,
        clock: Arc<RefreshClock>,
        executor: Arc<dyn QueryExecutor>,
        decoder: Arc<dyn ResponseDecoder>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            panel_id: panel_id.into(),
            clock,
            executor,
            decoder,
            reporter: Arc::new(TracingReporter),
            runtime: None,
        }
    }

    /// Build with defaults on the current runtime.
    pub fn new(
        panel_id: impl Into<String>,
        clock: Arc<RefreshClock>,
        executor: Arc<dyn QueryExecutor>,
        decoder: Arc<dyn ResponseDecoder>,
    ) -> Result<Self, PanelError> {
        Self::builder(panel_id, clock, executor, decoder).build()
    }

    pub fn panel_id(&self) -> &str {
        &self.inner.panel_id
    }

    /// Start a session, fetch if there is something visible to fetch, and
    /// subscribe to the refresh clock.
    ///
    /// An empty query set finishes immediately as `Done` with no tables.
    ///
    /// # Errors
    ///
    /// `AlreadyActive` if called twice without `deactivate`. Every error,
    /// and any panic, is also sent to the reporter.
    pub fn activate(&self, props: PanelProps) -> Result<FetchDispatch, PanelError> {
        with_error_boundary(
            self.inner.reporter.as_ref(),
            &self.inner.component(),
            || Inner::activate(&self.inner, props),
        )
    }

    /// Apply new props, refetching only if the link, the visibility or the
    /// set of query texts changed.
    ///
    /// # Errors
    ///
    /// `NotActive` if there is no session.
    pub fn on_props_changed(&self, props: PanelProps) -> Result<FetchDispatch, PanelError> {
        with_error_boundary(
            self.inner.reporter.as_ref(),
            &self.inner.component(),
            || Inner::props_changed(&self.inner, props),
        )
    }

    /// Refetch now, exactly as a clock tick would.
    pub fn refresh(&self) -> FetchDispatch {
        Inner::dispatch(&self.inner, self.inner.lock_state(), false)
    }

    /// End the session and unsubscribe from the clock.
    ///
    /// Returns the session as it stood. Fetches still in flight run to
    /// completion but their results are discarded. Calling this on an
    /// inactive panel returns `None`.
    pub fn deactivate(&self) -> Option<PanelSession> {
        self.inner.deactivate()
    }

    pub fn is_active(&self) -> bool {
        self.inner.lock_state().session.is_some()
    }

    /// Copy of the current session, if active.
    pub fn session(&self) -> Option<PanelSession> {
        self.inner.lock_state().session.clone()
    }

    /// Presentation decision for the current session, if active.
    pub fn render(&self) -> Option<PanelRender> {
        self.inner.lock_state().session.as_ref().map(render)
    }

    /// Receiver that sees every session change. After deactivation it keeps
    /// the last published session and receives nothing further.
    pub fn watch(&self) -> watch::Receiver<PanelSession> {
        self.inner.session_tx.subscribe()
    }
}

impl Drop for QueryOrchestrator {
    fn drop(&mut self) {
        self.inner.deactivate();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, PanelState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn component(&self) -> String {
        format!("panel:{}", self.panel_id)
    }

    fn publish(&self, session: &PanelSession) {
        self.session_tx.send_replace(session.clone());
    }

    fn activate(this: &Arc<Self>, props: PanelProps) -> Result<FetchDispatch, PanelError> {
        let mut state = this.lock_state();
        if state.session.is_some() {
            return Err(PanelError::AlreadyActive {
                panel: this.panel_id.clone(),
            });
        }

        info!(
            event = "core.panel.activate_started",
            panel = %this.panel_id,
            link = %props.link,
            query_count = props.queries.len(),
            visible = props.visible,
        );

        let session = PanelSession::new(props);
        this.publish(&session);
        let has_queries = !session.queries.is_empty();
        state.session = Some(session);

        let weak: Weak<Self> = Arc::downgrade(this);
        state.subscription = Some(this.clock.subscribe(move || {
            if let Some(inner) = weak.upgrade() {
                Self::dispatch(&inner, inner.lock_state(), false);
            }
        }));

        let dispatch = if has_queries {
            Self::dispatch(this, state, true)
        } else {
            this.clear(state)
        };

        info!(
            event = "core.panel.activate_completed",
            panel = %this.panel_id,
            fetch_issued = dispatch.is_issued(),
        );

        Ok(dispatch)
    }

    fn props_changed(this: &Arc<Self>, props: PanelProps) -> Result<FetchDispatch, PanelError> {
        let mut state = this.lock_state();
        let Some(session) = state.session.as_mut() else {
            return Err(PanelError::NotActive {
                panel: this.panel_id.clone(),
            });
        };

        let diff = session.diff(&props);
        if !diff.should_refetch() {
            debug!(event = "core.panel.props_unchanged", panel = %this.panel_id);
            return Ok(FetchDispatch::Skipped(SkipReason::Unchanged));
        }

        info!(
            event = "core.panel.props_changed",
            panel = %this.panel_id,
            link_changed = diff.link_changed,
            visibility_changed = diff.visibility_changed,
            queries_changed = diff.query_difference.len(),
        );

        session.apply_props(props);
        let no_queries = session.queries.is_empty();

        // Results issued under the old props must never land, even when the
        // new props skip the fetch (hidden panel).
        state.latest_generation += 1;

        if no_queries {
            return Ok(this.clear(state));
        }

        Ok(Self::dispatch(this, state, false))
    }

    /// Transition to `Done` with no tables, dropping any in-flight result.
    fn clear(&self, mut state: MutexGuard<'_, PanelState>) -> FetchDispatch {
        let PanelState {
            session,
            latest_generation,
            ..
        } = &mut *state;
        let Some(session) = session.as_mut() else {
            return FetchDispatch::Skipped(SkipReason::Inactive);
        };

        session.clear();
        *latest_generation += 1;
        self.publish(session);

        debug!(event = "core.panel.fetch_skipped", panel = %self.panel_id, reason = "no_queries");
        FetchDispatch::Cleared
    }

    /// The shared fetch path. Consumes the lock so the decision and the
    /// generation bump happen atomically.
    fn dispatch(
        this: &Arc<Self>,
        mut state: MutexGuard<'_, PanelState>,
        is_first_fetch: bool,
    ) -> FetchDispatch {
        let Some(session) = state.session.as_ref() else {
            return FetchDispatch::Skipped(SkipReason::Inactive);
        };

        if !session.visible {
            debug!(event = "core.panel.fetch_skipped", panel = %this.panel_id, reason = "hidden");
            return FetchDispatch::Skipped(SkipReason::Hidden);
        }

        if session.queries.is_empty() {
            return this.clear(state);
        }

        let PanelState {
            session,
            latest_generation,
            ..
        } = &mut *state;
        let Some(session) = session.as_mut() else {
            return FetchDispatch::Skipped(SkipReason::Inactive);
        };

        session.phase = LoadingPhase::Loading;
        session.is_first_fetch = is_first_fetch;
        *latest_generation += 1;
        let generation = *latest_generation;
        let link = session.link.clone();
        let queries = session.queries.clone();
        this.publish(session);
        drop(state);

        info!(
            event = "core.panel.fetch_started",
            panel = %this.panel_id,
            generation = generation,
            query_count = queries.len(),
            is_first_fetch = is_first_fetch,
        );

        let inner = Arc::clone(this);
        let handle = this.runtime.spawn(async move {
            let responses = execute_all(inner.executor.as_ref(), &link, &queries).await;
            inner.complete(generation, responses)
        });

        FetchDispatch::Issued(PendingFetch {
            panel: this.panel_id.clone(),
            generation,
            handle,
        })
    }

    fn complete(
        &self,
        generation: u64,
        responses: Result<Vec<RawResponse>, FetchError>,
    ) -> Result<FetchOutcome, PanelError> {
        let mut state = self.lock_state();
        let latest = state.latest_generation;
        let session = match state.session.as_mut() {
            Some(session) if latest == generation => session,
            _ => {
                debug!(
                    event = "core.panel.fetch_discarded",
                    panel = %self.panel_id,
                    generation = generation,
                    latest_generation = latest,
                );
                return Ok(FetchOutcome::Stale { generation });
            }
        };

        let responses = match responses {
            Ok(responses) => responses,
            Err(e) => {
                // Phase stays as it was (normally `Loading`); the next trigger retries.
                error!(
                    event = "core.panel.fetch_failed",
                    panel = %self.panel_id,
                    generation = generation,
                    error = %e,
                    retryable = e.is_retryable(),
                );
                return Ok(FetchOutcome::Failed {
                    generation,
                    error: e,
                });
            }
        };

        match decode_all(self.decoder.as_ref(), &responses) {
            Ok(tables) => {
                let table_count = tables.len();
                session.tables = tables;
                session.phase = LoadingPhase::Done;
                session.last_updated = Some(Utc::now());
                session.fault = None;
                self.publish(session);
                drop(state);

                info!(
                    event = "core.panel.fetch_completed",
                    panel = %self.panel_id,
                    generation = generation,
                    table_count = table_count,
                );
                Ok(FetchOutcome::Applied {
                    generation,
                    table_count,
                })
            }
            Err(source) => {
                session.phase = LoadingPhase::Error;
                session.fault = Some(source.to_string());
                self.publish(session);
                drop(state);

                let fault = PanelError::DecodeFault {
                    panel: self.panel_id.clone(),
                    generation,
                    source,
                };
                self.reporter
                    .report(ErrorReport::from_error(self.component(), &fault));
                Err(fault)
            }
        }
    }

    fn deactivate(&self) -> Option<PanelSession> {
        let mut state = self.lock_state();
        let session = state.session.take()?;
        state.latest_generation += 1;
        let subscription = state.subscription.take();
        drop(state);

        match subscription {
            Some(id) => {
                self.clock.unsubscribe(id);
            }
            None => warn!(
                event = "core.panel.subscription_missing",
                panel = %self.panel_id,
            ),
        }

        info!(
            event = "core.panel.deactivate_completed",
            panel = %self.panel_id,
            phase = %session.phase,
        );

        Some(session)
    }
}
