//! Read-only sensor views over the latest poll and the tracking memory.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{HomeroomError, Result};
use crate::poller::PollSnapshot;
use crate::store::write_atomic;
use crate::tracker::TrackingMemory;

/// Upper bound on the serialized size of a sensor's item list.
pub const MAX_ATTRIBUTE_CHARS: usize = 12_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Students,
    Courses,
    Assignments,
    Submissions,
    HomeworkEvents,
}

impl SensorKind {
    pub const ALL: [SensorKind; 5] = [
        SensorKind::Students,
        SensorKind::Courses,
        SensorKind::Assignments,
        SensorKind::Submissions,
        SensorKind::HomeworkEvents,
    ];

    /// Attribute prefix.
    pub fn key(self) -> &'static str {
        match self {
            SensorKind::Students => "student",
            SensorKind::Courses => "course",
            SensorKind::Assignments => "assignment",
            SensorKind::Submissions => "submission",
            SensorKind::HomeworkEvents => "homework_events",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SensorKind::Students => "Canvas Students",
            SensorKind::Courses => "Canvas Courses",
            SensorKind::Assignments => "Canvas Assignments",
            SensorKind::Submissions => "Canvas Submissions",
            SensorKind::HomeworkEvents => "Canvas Homework Events",
        }
    }

    pub fn unique_id(self) -> String {
        format!("canvas_{}", self.key())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SensorState {
    pub unique_id: String,
    pub name: String,
    /// Number of items in the latest poll.
    pub state: usize,
    pub attributes: Map<String, Value>,
}

/// `{key}`, `{key}_count` and `{key}_truncated` for a collection.
///
/// Items are added in order until the next one would push the serialized
/// total past [`MAX_ATTRIBUTE_CHARS`]. An empty collection only reports
/// `{key}_count: 0`.
pub fn collection_attributes<T: Serialize>(key: &str, items: &[T]) -> Map<String, Value> {
    let mut attributes = Map::new();
    if items.is_empty() {
        attributes.insert(format!("{key}_count"), Value::from(0));
        return attributes;
    }

    let mut kept = Vec::new();
    let mut total = 0;
    for item in items {
        let value = match serde_json::to_value(item) {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "Skipping unserializable item");
                continue;
            }
        };
        let size = value.to_string().chars().count();
        if total + size > MAX_ATTRIBUTE_CHARS {
            break;
        }
        total += size;
        kept.push(value);
    }

    let truncated = kept.len() < items.len();
    attributes.insert(key.to_string(), Value::Array(kept));
    attributes.insert(format!("{key}_count"), Value::from(items.len()));
    attributes.insert(format!("{key}_truncated"), Value::Bool(truncated));
    attributes
}

/// Inputs the sensors are derived from.
pub struct SensorSource<'a> {
    pub snapshot: Option<&'a PollSnapshot>,
    pub memory: &'a TrackingMemory,
    pub persistence_disabled: bool,
    pub last_update: Option<DateTime<Utc>>,
}

impl SensorSource<'_> {
    pub fn sensor(&self, kind: SensorKind) -> SensorState {
        let empty = PollSnapshot::default();
        let snapshot = self.snapshot.unwrap_or(&empty);
        let key = kind.key();

        let (state, mut attributes) = match kind {
            SensorKind::Students => (
                snapshot.students.len(),
                collection_attributes(key, &snapshot.students),
            ),
            SensorKind::Courses => (
                snapshot.courses.len(),
                collection_attributes(key, &snapshot.courses),
            ),
            SensorKind::Assignments | SensorKind::HomeworkEvents => (
                snapshot.assignments.len(),
                collection_attributes(key, &snapshot.assignments),
            ),
            SensorKind::Submissions => (
                snapshot.submissions.len(),
                collection_attributes(key, &snapshot.submissions),
            ),
        };

        if kind == SensorKind::HomeworkEvents {
            self.add_homework_summary(&mut attributes);
        }

        SensorState {
            unique_id: kind.unique_id(),
            name: kind.name().to_string(),
            state,
            attributes,
        }
    }

    pub fn sensors(&self) -> Vec<SensorState> {
        SensorKind::ALL.iter().map(|&kind| self.sensor(kind)).collect()
    }

    fn add_homework_summary(&self, attributes: &mut Map<String, Value>) {
        let memory = self.memory;
        let students = serde_json::to_value(memory.summaries()).unwrap_or(Value::Null);

        attributes.insert(
            "total_known_assignments".into(),
            Value::from(memory.total_known()),
        );
        attributes.insert(
            "total_completed_assignments".into(),
            Value::from(memory.total_completed()),
        );
        attributes.insert(
            "total_pending_assignments".into(),
            Value::from(memory.total_pending()),
        );
        attributes.insert("students".into(), students);
        attributes.insert(
            "student_count".into(),
            Value::from(memory.student_info().len()),
        );
        attributes.insert(
            "persistence_disabled".into(),
            Value::Bool(self.persistence_disabled),
        );
        attributes.insert(
            "last_update".into(),
            self.last_update
                .map(|t| Value::String(t.to_rfc3339_opts(SecondsFormat::Secs, true)))
                .unwrap_or(Value::Null),
        );
    }
}

/// Write sensor states as a JSON array, replacing the file atomically.
pub fn write_sensor_file(path: &Path, sensors: &[SensorState]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(sensors)
        .map_err(|e| HomeroomError::Serialization(format!("sensor states: {e}")))?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlate::Correlation;
    use crate::testing::{assignment, course, student, submission};

    #[derive(Serialize)]
    struct Blob {
        text: String,
    }

    fn blobs(count: usize, size: usize) -> Vec<Blob> {
        (0..count)
            .map(|_| Blob {
                text: "x".repeat(size),
            })
            .collect()
    }

    fn snapshot() -> PollSnapshot {
        PollSnapshot {
            students: vec![student("s1", "Avery Lee")],
            courses: vec![course("c1", "Biology", "s1")],
            assignments: vec![
                assignment("a1", "c1", "Lab report"),
                assignment("a2", "c1", "Quiz"),
            ],
            submissions: vec![submission("a1", "submitted", Some("2024-01-01T00:00:00Z"))],
        }
    }

    #[test]
    fn empty_collection_only_has_count() {
        let attributes = collection_attributes::<Blob>("course", &[]);
        assert_eq!(attributes.len(), 1);
        assert_eq!(attributes["course_count"], 0);
    }

    #[test]
    fn small_collection_is_complete() {
        let attributes = collection_attributes("assignment", &blobs(3, 10));
        assert_eq!(attributes["assignment"].as_array().unwrap().len(), 3);
        assert_eq!(attributes["assignment_count"], 3);
        assert_eq!(attributes["assignment_truncated"], false);
    }

    #[test]
    fn large_collection_is_capped() {
        let items = blobs(50, 1_000);
        let attributes = collection_attributes("assignment", &items);
        let kept = attributes["assignment"].as_array().unwrap();

        assert!(kept.len() < items.len());
        assert!(!kept.is_empty());
        let total: usize = kept.iter().map(|v| v.to_string().chars().count()).sum();
        assert!(total <= MAX_ATTRIBUTE_CHARS);
        assert_eq!(attributes["assignment_count"], 50);
        assert_eq!(attributes["assignment_truncated"], true);
    }

    #[test]
    fn five_sensors_with_stable_ids() {
        let memory = TrackingMemory::new();
        let sensors = SensorSource {
            snapshot: None,
            memory: &memory,
            persistence_disabled: false,
            last_update: None,
        }
        .sensors();

        let ids: Vec<_> = sensors.iter().map(|s| s.unique_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "canvas_student",
                "canvas_course",
                "canvas_assignment",
                "canvas_submission",
                "canvas_homework_events"
            ]
        );
        assert!(sensors.iter().all(|s| s.state == 0));
    }

    #[test]
    fn homework_sensor_reports_counts() {
        let snapshot = snapshot();
        let mut memory = TrackingMemory::new();
        memory.remember_students(&snapshot.students);
        memory.detect_changes(&Correlation::from_snapshot(&snapshot), Utc::now());

        let now = Utc::now();
        let sensor = SensorSource {
            snapshot: Some(&snapshot),
            memory: &memory,
            persistence_disabled: true,
            last_update: Some(now),
        }
        .sensor(SensorKind::HomeworkEvents);

        assert_eq!(sensor.state, 2);
        let attrs = &sensor.attributes;
        assert_eq!(attrs["homework_events_count"], 2);
        assert_eq!(attrs["total_known_assignments"], 2);
        assert_eq!(attrs["total_completed_assignments"], 1);
        assert_eq!(attrs["total_pending_assignments"], 1);
        assert_eq!(attrs["student_count"], 1);
        assert_eq!(attrs["students"]["s1"]["name"], "Avery Lee");
        assert_eq!(attrs["students"]["s1"]["pending_assignments"], 1);
        assert_eq!(attrs["persistence_disabled"], true);
        assert!(attrs["last_update"].is_string());
    }

    #[test]
    fn sensor_file_is_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sensors.json");
        let snapshot = snapshot();
        let memory = TrackingMemory::new();
        let sensors = SensorSource {
            snapshot: Some(&snapshot),
            memory: &memory,
            persistence_disabled: false,
            last_update: None,
        }
        .sensors();

        write_sensor_file(&path, &sensors).unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw.as_array().unwrap().len(), 5);
        assert_eq!(raw[0]["state"], 1);
        assert_eq!(raw[0]["attributes"]["student"][0]["id"], "s1");
    }
}
