use crate::clock::Clock;
use crate::commands::{self, Confirm};
use crate::error::{Error, Result};
use crate::event_log::EventLog;
use crate::events::{Dispatched, Dispatcher, Event};
use crate::metrics::{derive, DerivedView};
use crate::models::RawSnapshot;
use crate::reconcile::ViewReconciler;
use crate::render::{Notification, RenderTarget};
use crate::snapshot::{normalize, Snapshot};
use crate::transport::{ClusterApi, Feed};

/// Engine context: owns the render target, the widget registry, the event
/// log and the last-known-good view. All access happens from one dispatch
/// context, so nothing here is shared or locked.
pub struct Engine<R: RenderTarget> {
    target: R,
    clock: Box<dyn Clock>,
    reconciler: ViewReconciler,
    log: EventLog,
    snapshot: Option<Snapshot>,
    view: Option<DerivedView>,
    updates: u64,
}

impl<R: RenderTarget> Engine<R> {
    pub fn new(target: R, clock: Box<dyn Clock>) -> Self {
        Self {
            target,
            clock,
            reconciler: ViewReconciler::new(),
            log: EventLog::new(),
            snapshot: None,
            view: None,
            updates: 0,
        }
    }

    pub fn ingest(&mut self, raw: RawSnapshot) -> &DerivedView {
        let snapshot = normalize(raw);
        tracing::debug!(
            vms = snapshot.vms.len(),
            cloudlets = snapshot.cloudlets.len(),
            "snapshot ingested"
        );
        let view = derive(&snapshot, self.clock.now());
        self.reconciler.apply(&snapshot, &view, &mut self.target);
        self.snapshot = Some(snapshot);
        self.updates += 1;
        self.view.insert(view)
    }

    /// Recomputes the view from the last snapshot at the current clock.
    pub fn redraw(&mut self) -> Option<&DerivedView> {
        let snapshot = self.snapshot.as_ref()?;
        let view = derive(snapshot, self.clock.now());
        self.reconciler.apply(snapshot, &view, &mut self.target);
        self.updates += 1;
        Some(self.view.insert(view))
    }

    pub fn record(&mut self, message: &str) {
        let now = self.clock.now();
        self.log.append(now, message);
    }

    pub fn notify(&mut self, notification: Notification) {
        self.target.show_notification(&notification);
    }

    pub fn dismiss_notification(&mut self) {
        self.target.dismiss_notification();
    }

    /// A delivery failed; the current view stays on screen.
    pub fn feed_failed(&mut self, err: &Error) {
        tracing::warn!(
            error = %err,
            updates = self.updates,
            "snapshot delivery failed, keeping last view"
        );
    }

    pub fn dispatch(
        &mut self,
        event: Event,
        api: &mut dyn ClusterApi,
        confirm: &mut dyn Confirm,
    ) -> Result<Dispatched> {
        match event {
            Event::Snapshot(raw) => {
                self.ingest(raw);
                Ok(Dispatched::Rendered)
            }
            Event::Redraw => {
                self.redraw();
                Ok(Dispatched::Rendered)
            }
            Event::Log(message) => {
                self.record(&message);
                Ok(Dispatched::Logged)
            }
            Event::DismissNotification => {
                self.dismiss_notification();
                Ok(Dispatched::Dismissed)
            }
            Event::Command(command) => {
                commands::execute(self, api, confirm, command).map(Dispatched::Command)
            }
        }
    }

    /// Applies every queued event in dispatch order.
    pub fn drain(
        &mut self,
        dispatcher: &mut Dispatcher,
        api: &mut dyn ClusterApi,
        confirm: &mut dyn Confirm,
    ) -> Vec<Result<Dispatched>> {
        let mut results = Vec::with_capacity(dispatcher.len());
        while let Some(scheduled) = dispatcher.pop() {
            tracing::trace!(seq = scheduled.seq, "dispatching event");
            results.push(self.dispatch(scheduled.event, api, confirm));
        }
        results
    }

    /// Pulls one event from the feed and applies it. `None` once the feed is
    /// exhausted; delivery failures are reported and leave the view alone.
    pub fn pump(&mut self, feed: &mut dyn Feed) -> Option<Result<Dispatched>> {
        match feed.next_event() {
            Ok(Some(event)) => match Event::from(event) {
                Event::Snapshot(raw) => {
                    self.ingest(raw);
                    Some(Ok(Dispatched::Rendered))
                }
                Event::Log(message) => {
                    self.record(&message);
                    Some(Ok(Dispatched::Logged))
                }
                _ => None,
            },
            Ok(None) => None,
            Err(err) => {
                self.feed_failed(&err);
                Some(Err(err))
            }
        }
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    pub fn view(&self) -> Option<&DerivedView> {
        self.view.as_ref()
    }

    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn reconciler(&self) -> &ViewReconciler {
        &self.reconciler
    }

    pub fn updates(&self) -> u64 {
        self.updates
    }

    pub fn now(&self) -> f64 {
        self.clock.now()
    }
}
