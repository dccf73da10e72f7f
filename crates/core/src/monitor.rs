//! One homework update cycle, end to end.
//!
//! A cycle polls Canvas, correlates by student, detects appearances and
//! completions, evicts stale identifiers, saves the tracking memory and then
//! publishes the notifications. [`HomeworkMonitor::update`] never fails: any
//! error aborts the cycle, leaves the previous state in place and comes back
//! as a failed [`CycleReport`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::config::HomeroomConfig;
use crate::connectors::canvas::CanvasConnector;
use crate::correlate::Correlation;
use crate::error::Result;
use crate::gate::FetchGate;
use crate::notify::{publish_all, EventSink, HomeworkEvent, LogSink, WebhookSink};
use crate::poller::{PollSnapshot, Poller};
use crate::presentation::{SensorSource, SensorState};
use crate::store::{JsonFileStore, StateStore};
use crate::tracker::TrackingMemory;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CycleStatus {
    Completed,
    Failed,
}

/// Outcome of a single [`HomeworkMonitor::update`] call.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub status: CycleStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub appeared: usize,
    pub completed: usize,
    pub evicted: usize,
    /// Whether the tracking memory was written this cycle.
    pub saved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip)]
    pub events: Vec<HomeworkEvent>,
}

impl CycleReport {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            status: CycleStatus::Failed,
            started_at: now,
            finished_at: now,
            appeared: 0,
            completed: 0,
            evicted: 0,
            saved: false,
            error_message: None,
            events: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == CycleStatus::Completed
    }
}

/// Owns the tracking memory and drives update cycles.
///
/// `update` takes `&mut self`, so two cycles can never overlap on the same
/// monitor.
pub struct HomeworkMonitor {
    poller: Poller,
    /// `None` when persistence is disabled.
    store: Option<Arc<dyn StateStore>>,
    sinks: Vec<Arc<dyn EventSink>>,
    memory: TrackingMemory,
    loaded: bool,
    latest: Option<PollSnapshot>,
    last_update: Option<DateTime<Utc>>,
}

impl HomeworkMonitor {
    pub fn new(poller: Poller, store: Option<Arc<dyn StateStore>>) -> Self {
        Self {
            poller,
            store,
            sinks: Vec::new(),
            memory: TrackingMemory::new(),
            loaded: false,
            latest: None,
            last_update: None,
        }
    }

    /// Canvas connector, file store and sinks as described by `config`.
    pub fn from_config(config: &HomeroomConfig) -> Result<Self> {
        let connector = CanvasConnector::new(&config.canvas)?;
        let gate = FetchGate::new(config.canvas.concurrency_limit);
        let poller = Poller::new(Arc::new(connector), gate);

        let store: Option<Arc<dyn StateStore>> = if config.tracking.disable_persistence {
            None
        } else {
            Some(Arc::new(JsonFileStore::new(config.state_path())))
        };

        let mut monitor = Self::new(poller, store).with_sink(Arc::new(LogSink));
        for webhook in config.webhooks.iter().filter(|w| w.enabled) {
            monitor = monitor.with_sink(Arc::new(WebhookSink::new(webhook)?));
        }
        Ok(monitor)
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn poller(&self) -> &Poller {
        &self.poller
    }

    pub fn memory(&self) -> &TrackingMemory {
        &self.memory
    }

    /// Data from the last successful cycle.
    pub fn latest(&self) -> Option<&PollSnapshot> {
        self.latest.as_ref()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn persistence_disabled(&self) -> bool {
        self.store.is_none()
    }

    pub fn sensors(&self) -> Vec<SensorState> {
        SensorSource {
            snapshot: self.latest.as_ref(),
            memory: &self.memory,
            persistence_disabled: self.persistence_disabled(),
            last_update: self.last_update,
        }
        .sensors()
    }

    /// Run one cycle.
    pub async fn update(&mut self) -> CycleReport {
        let mut report = CycleReport::started();
        self.load_once().await;

        match self.run_cycle(&mut report).await {
            Ok(()) => {
                report.status = CycleStatus::Completed;
                info!(
                    appeared = report.appeared,
                    completed = report.completed,
                    evicted = report.evicted,
                    saved = report.saved,
                    "Homework update cycle complete"
                );
            }
            Err(e) => {
                error!(error = %e, "Homework update cycle failed");
                report.status = CycleStatus::Failed;
                report.error_message = Some(e.to_string());
            }
        }

        report.finished_at = Utc::now();
        report
    }

    async fn load_once(&mut self) {
        if self.loaded {
            return;
        }
        self.loaded = true;
        let Some(store) = &self.store else {
            return;
        };

        match store.load().await {
            Ok(Some(state)) => {
                self.memory = TrackingMemory::from_stored(state);
                info!(
                    students = self.memory.student_info().len(),
                    known = self.memory.total_known(),
                    "Loaded homework state"
                );
            }
            Ok(None) => info!("No previous homework state found, starting fresh"),
            Err(e) => {
                warn!(error = %e, "Failed to load homework state, starting fresh");
                self.memory = TrackingMemory::new();
            }
        }
    }

    async fn run_cycle(&mut self, report: &mut CycleReport) -> Result<()> {
        let snapshot = self.poller.poll_snapshot().await?;
        let now = Utc::now();

        let mut working = self.memory.clone();
        working.remember_students(&snapshot.students);
        let correlation = Correlation::from_snapshot(&snapshot);
        let events = working.detect_changes(&correlation, now);
        if self.store.is_some() {
            report.evicted = working.evict_stale(&correlation);
        }
        self.memory = working;

        if let Some(store) = &self.store {
            match store.save(&self.memory.to_stored(Utc::now())).await {
                Ok(()) => report.saved = true,
                Err(e) => error!(error = %e, "Failed to save homework state"),
            }
        }

        publish_all(&self.sinks, &events).await;

        report.appeared = events
            .iter()
            .filter(|e| matches!(e, HomeworkEvent::Appeared(_)))
            .count();
        report.completed = events.len() - report.appeared;
        report.events = events;
        self.latest = Some(snapshot);
        self.last_update = Some(now);
        Ok(())
    }
}
