//! Homework notifications and the sinks that receive them.
//!
//! The engine produces [`HomeworkEvent`]s; a host decides where they go by
//! handing the monitor a list of [`EventSink`]s.

pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::{HomeroomError, Result};
use crate::models::{Assignment, Student, Submission};

pub use self::webhook::WebhookSink;

/// Event name for a newly seen assignment.
pub const HOMEWORK_APPEARED: &str = "canvas_homework_appeared";

/// Event name for a newly turned-in assignment.
pub const HOMEWORK_COMPLETED: &str = "canvas_homework_completed";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeworkAppeared {
    pub assignment_id: String,
    pub assignment_name: String,
    pub course_name: String,
    pub due_at: Option<String>,
    pub points_possible: Option<f64>,
    pub html_url: Option<String>,
    pub student_id: String,
    pub student_name: String,
    pub student_short_name: String,
    pub timestamp: DateTime<Utc>,
}

impl HomeworkAppeared {
    pub fn new(student: &Student, assignment: &Assignment, timestamp: DateTime<Utc>) -> Self {
        Self {
            assignment_id: assignment.id.clone(),
            assignment_name: assignment.name.clone(),
            course_name: assignment.course_name.clone(),
            due_at: assignment.due_at.clone(),
            points_possible: assignment.points_possible,
            html_url: assignment.html_url.clone(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            student_short_name: student.short_name.clone(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HomeworkCompleted {
    pub assignment_id: String,
    pub assignment_name: String,
    pub course_name: String,
    pub submitted_at: Option<String>,
    pub score: Option<f64>,
    pub grade: Option<String>,
    pub html_url: Option<String>,
    pub student_id: String,
    pub student_name: String,
    pub student_short_name: String,
    pub timestamp: DateTime<Utc>,
}

impl HomeworkCompleted {
    pub fn new(
        student: &Student,
        assignment: &Assignment,
        submission: &Submission,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            assignment_id: assignment.id.clone(),
            assignment_name: assignment.name.clone(),
            course_name: assignment.course_name.clone(),
            submitted_at: submission.submitted_at.clone(),
            score: submission.score,
            grade: submission.grade.clone(),
            html_url: assignment.html_url.clone(),
            student_id: student.id.clone(),
            student_name: student.name.clone(),
            student_short_name: student.short_name.clone(),
            timestamp,
        }
    }
}

/// A named notification with its payload.
#[derive(Debug, Clone, PartialEq)]
pub enum HomeworkEvent {
    Appeared(HomeworkAppeared),
    Completed(HomeworkCompleted),
}

impl HomeworkEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Appeared(_) => HOMEWORK_APPEARED,
            Self::Completed(_) => HOMEWORK_COMPLETED,
        }
    }

    pub fn student_id(&self) -> &str {
        match self {
            Self::Appeared(e) => &e.student_id,
            Self::Completed(e) => &e.student_id,
        }
    }

    pub fn assignment_id(&self) -> &str {
        match self {
            Self::Appeared(e) => &e.assignment_id,
            Self::Completed(e) => &e.assignment_id,
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            Self::Appeared(e) => e.timestamp,
            Self::Completed(e) => e.timestamp,
        }
    }

    /// The event payload as a JSON object.
    pub fn payload(&self) -> Result<serde_json::Value> {
        let value = match self {
            Self::Appeared(e) => serde_json::to_value(e),
            Self::Completed(e) => serde_json::to_value(e),
        };
        value.map_err(|e| HomeroomError::Serialization(format!("event payload: {e}")))
    }
}

/// Destination for homework notifications.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn publish(&self, event: &HomeworkEvent) -> Result<()>;

    /// Short label used in logs.
    fn name(&self) -> &str;
}

/// Deliver every event to every sink. Failures are logged, never returned.
pub async fn publish_all(sinks: &[Arc<dyn EventSink>], events: &[HomeworkEvent]) -> usize {
    let mut failures = 0;
    for event in events {
        for sink in sinks {
            if let Err(e) = sink.publish(event).await {
                failures += 1;
                warn!(
                    sink = sink.name(),
                    event = event.name(),
                    student_id = %event.student_id(),
                    assignment_id = %event.assignment_id(),
                    error = %e,
                    "Failed to publish homework event"
                );
            }
        }
    }
    failures
}

/// Writes one structured log line per event.
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn publish(&self, event: &HomeworkEvent) -> Result<()> {
        match event {
            HomeworkEvent::Appeared(e) => info!(
                event = HOMEWORK_APPEARED,
                student = %e.student_name,
                assignment = %e.assignment_name,
                course = %e.course_name,
                due_at = e.due_at.as_deref().unwrap_or("-"),
                "New homework"
            ),
            HomeworkEvent::Completed(e) => info!(
                event = HOMEWORK_COMPLETED,
                student = %e.student_name,
                assignment = %e.assignment_name,
                course = %e.course_name,
                submitted_at = e.submitted_at.as_deref().unwrap_or("-"),
                "Homework turned in"
            ),
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Forwards events into a tokio channel for an embedding host.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<HomeworkEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<HomeworkEvent>) -> Self {
        Self { tx }
    }

    /// A sink together with the receiving half of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<HomeworkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn publish(&self, event: &HomeworkEvent) -> Result<()> {
        self.tx
            .send(event.clone())
            .map_err(|_| HomeroomError::Notify("event channel closed".into()))
    }

    fn name(&self) -> &str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{assignment, student, submission};

    fn appeared() -> HomeworkEvent {
        HomeworkEvent::Appeared(HomeworkAppeared::new(
            &student("s1", "Avery Lee"),
            &assignment("a1", "c1", "Lab report"),
            Utc::now(),
        ))
    }

    struct FailingSink;

    #[async_trait]
    impl EventSink for FailingSink {
        async fn publish(&self, _event: &HomeworkEvent) -> Result<()> {
            Err(HomeroomError::Notify("unreachable".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn appeared_payload_fields() {
        let event = appeared();
        assert_eq!(event.name(), "canvas_homework_appeared");
        let payload = event.payload().unwrap();
        assert_eq!(payload["assignment_id"], "a1");
        assert_eq!(payload["assignment_name"], "Lab report");
        assert_eq!(payload["student_name"], "Avery Lee");
        assert_eq!(payload["student_short_name"], "Avery");
        assert_eq!(payload["points_possible"], 10.0);
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn completed_payload_fields() {
        let event = HomeworkEvent::Completed(HomeworkCompleted::new(
            &student("s1", "Avery Lee"),
            &assignment("a1", "c1", "Lab report"),
            &submission("a1", "submitted", Some("2024-01-01T00:00:00Z")),
            Utc::now(),
        ));
        assert_eq!(event.name(), "canvas_homework_completed");
        let payload = event.payload().unwrap();
        assert_eq!(payload["submitted_at"], "2024-01-01T00:00:00Z");
        assert_eq!(payload["grade"], "A");
        assert_eq!(payload["score"], 9.0);
        assert!(payload.get("due_at").is_none());
    }

    #[tokio::test]
    async fn channel_sink_forwards_events() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.publish(&appeared()).await.unwrap();
        let received = rx.recv().await.unwrap();
        assert_eq!(received.assignment_id(), "a1");
    }

    #[tokio::test]
    async fn channel_sink_reports_closed_channel() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        let err = sink.publish(&appeared()).await.unwrap_err();
        assert!(matches!(err, HomeroomError::Notify(_)));
    }

    #[tokio::test]
    async fn publish_all_continues_past_failures() {
        let (channel, mut rx) = ChannelSink::channel();
        let sinks: Vec<Arc<dyn EventSink>> = vec![Arc::new(FailingSink), Arc::new(channel)];
        let events = vec![appeared(), appeared()];

        let failures = publish_all(&sinks, &events).await;
        assert_eq!(failures, 2);
        assert!(rx.recv().await.is_some());
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn log_sink_accepts_everything() {
        assert!(LogSink.publish(&appeared()).await.is_ok());
    }
}
