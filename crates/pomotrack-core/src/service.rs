//! The running timer: engine + tick source + settings + recording.
//!
//! `TimerService` is what a shell talks to. Every command is synchronous
//! and returns the event it produced (or `None` for a no-op); the same
//! events, plus per-second ticks and recording outcomes, are broadcast to
//! subscribers.
//!
//! All state sits behind one mutex that is never held across an await. The
//! tick task only keeps a weak reference, so dropping the service stops it.

use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::events::Event;
use crate::recorder::{spawn_worker, SessionRecorder};
use crate::settings::SettingsResolver;
use crate::storage::{SessionStore, SettingsStore};
use crate::timer::{
    CompletedSession, Completion, CompletionNotifier, PendingCompletion, ProjectId, SessionType,
    Ticker, TimerEngine, TimerSettings, TimerState, DEFAULT_TICK,
};

const EVENT_CAPACITY: usize = 256;

#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub tick: Duration,
    pub project_id: Option<ProjectId>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            project_id: None,
        }
    }
}

struct Inner {
    engine: TimerEngine,
    notifier: CompletionNotifier,
    resolver: SettingsResolver,
    ticker: Ticker,
    recorder_tx: Option<mpsc::UnboundedSender<CompletedSession>>,
    events: broadcast::Sender<Event>,
}

pub struct TimerService {
    inner: Arc<Mutex<Inner>>,
    events: broadcast::Sender<Event>,
    recorder_task: Option<JoinHandle<()>>,
}

impl TimerService {
    /// Build a paused focus interval for `options.project_id`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        settings_store: Box<dyn SettingsStore>,
        session_store: Box<dyn SessionStore>,
        options: ServiceOptions,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let resolver = SettingsResolver::new(settings_store);
        let settings = resolver.resolve(options.project_id.as_deref());
        let engine = TimerEngine::new(settings, options.project_id);
        let (recorder_tx, recorder_task) =
            spawn_worker(SessionRecorder::new(session_store), events.clone());

        let inner = Inner {
            engine,
            notifier: CompletionNotifier::new(),
            resolver,
            ticker: Ticker::new(options.tick),
            recorder_tx: Some(recorder_tx),
            events: events.clone(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            events,
            recorder_task: Some(recorder_task),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.inner)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.lock().engine.state().clone()
    }

    pub fn settings(&self) -> TimerSettings {
        *self.lock().engine.settings()
    }

    pub fn pending(&self) -> Option<PendingCompletion> {
        self.lock().notifier.pending().copied()
    }

    pub fn snapshot(&self) -> Event {
        self.lock().engine.snapshot()
    }

    /// Whether a tick task is live.
    pub fn is_ticking(&self) -> bool {
        self.lock().ticker.is_active()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start counting down. Ignored while running or while a completion
    /// is waiting for an answer.
    pub fn start(&self) -> Option<Event> {
        let mut inner = self.lock();
        if inner.notifier.pending().is_some() {
            debug!("start ignored: completion pending");
            return None;
        }
        let event = inner.engine.start()?;
        install_ticker(&mut inner, Arc::downgrade(&self.inner));
        inner.emit(event)
    }

    pub fn pause(&self) -> Option<Event> {
        let mut inner = self.lock();
        inner.ticker.cancel();
        let event = inner.engine.pause()?;
        inner.emit(event)
    }

    /// Reload the current interval. Also closes any pending prompt.
    pub fn reset(&self) -> Option<Event> {
        let mut inner = self.lock();
        inner.ticker.cancel();
        inner.dismiss_pending();
        let event = inner.engine.reset()?;
        inner.emit(event)
    }

    /// Jump to another session type. Also closes any pending prompt.
    pub fn switch_session(&self, session_type: SessionType) -> Option<Event> {
        let mut inner = self.lock();
        inner.ticker.cancel();
        inner.dismiss_pending();
        let event = inner.engine.switch_session(session_type)?;
        inner.emit(event)
    }

    /// Rebind the project and pick up its settings. The countdown is
    /// untouched while running.
    pub fn set_current_project(&self, project_id: Option<ProjectId>) -> Option<Event> {
        let mut inner = self.lock();
        let event = inner.engine.set_current_project(project_id)?;
        let event = inner.emit(event);
        inner.refresh_settings();
        event
    }

    /// Persist settings for `project_id` (`None` = global) and apply them if
    /// they affect the current project.
    pub fn save_settings(
        &self,
        project_id: Option<&str>,
        settings: &TimerSettings,
    ) -> Result<Option<Event>> {
        let mut inner = self.lock();
        inner.resolver.save(project_id, settings)?;
        Ok(inner.refresh_settings())
    }

    /// Remove stored settings for `project_id` and re-resolve.
    pub fn reset_settings(&self, project_id: Option<&str>) -> Result<Option<Event>> {
        let mut inner = self.lock();
        inner.resolver.reset(project_id)?;
        Ok(inner.refresh_settings())
    }

    /// Re-resolve settings for the current project, e.g. after another
    /// process changed the store.
    pub fn refresh_settings(&self) -> Option<Event> {
        self.lock().refresh_settings()
    }

    /// Close the completion prompt without advancing.
    pub fn dismiss(&self) -> Option<Event> {
        let mut inner = self.lock();
        let event = inner.notifier.dismiss()?;
        inner.emit(event)
    }

    /// Start the interval suggested by the pending completion.
    pub fn accept_and_start_next(&self) -> Option<Event> {
        let mut inner = self.lock();
        let Inner {
            engine, notifier, ..
        } = &mut *inner;
        let event = notifier.accept_and_start_next(engine)?;
        install_ticker(&mut inner, Arc::downgrade(&self.inner));
        inner.emit(event)
    }

    /// Stop ticking, then wait for queued sessions to be stored.
    pub async fn shutdown(mut self) {
        {
            let mut inner = self.lock();
            inner.ticker.cancel();
            inner.recorder_tx = None;
        }
        if let Some(task) = self.recorder_task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "recorder task failed");
            }
        }
    }
}

impl Drop for TimerService {
    fn drop(&mut self) {
        let mut inner = self.lock();
        inner.ticker.cancel();
        inner.recorder_tx = None;
    }
}

impl Inner {
    fn emit(&self, event: Event) -> Option<Event> {
        let _ = self.events.send(event.clone());
        Some(event)
    }

    fn dismiss_pending(&mut self) {
        if let Some(event) = self.notifier.dismiss() {
            self.emit(event);
        }
    }

    fn refresh_settings(&mut self) -> Option<Event> {
        let settings = self.resolver.resolve(self.engine.current_project_id());
        let event = self.engine.apply_settings(settings)?;
        self.emit(event)
    }

    fn on_tick(&mut self, generation: u64) -> ControlFlow<()> {
        if generation != self.ticker.generation() || !self.engine.is_running() {
            return ControlFlow::Break(());
        }
        match self.engine.tick() {
            None => {
                let _ = self.events.send(Event::Tick {
                    time_left: self.engine.time_left(),
                });
                ControlFlow::Continue(())
            }
            Some(completion) => {
                self.on_completion(completion);
                ControlFlow::Break(())
            }
        }
    }

    fn on_completion(&mut self, completion: Completion) {
        if let Some(session) = completion.session.clone() {
            match self.recorder_tx.as_ref() {
                Some(tx) => {
                    if tx.send(session).is_err() {
                        warn!("recorder stopped; completed session dropped");
                    }
                }
                None => warn!("service shutting down; completed session dropped"),
            }
        }
        if let Err(e) = self.notifier.raise(PendingCompletion::from(&completion)) {
            warn!(error = %e, "completion not raised");
        }
        self.emit(completion.event());
    }
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(|e| e.into_inner())
}

fn install_ticker(inner: &mut Inner, weak: Weak<Mutex<Inner>>) {
    inner.ticker.install(move |generation| match weak.upgrade() {
        Some(shared) => lock(&shared).on_tick(generation),
        None => ControlFlow::Break(()),
    });
}
