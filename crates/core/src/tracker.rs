//! Change detection over per-student assignment identifiers.
//!
//! Each assignment moves `unknown -> known -> completed`. [`TrackingMemory`]
//! is a plain value: the monitor clones it, applies one cycle's
//! [`Correlation`] to the clone, and only keeps the result if the whole
//! cycle succeeds.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::correlate::Correlation;
use crate::models::Student;
use crate::notify::{HomeworkAppeared, HomeworkCompleted, HomeworkEvent};
use crate::store::StoredState;

/// Known/completed assignment sets and cached student details.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackingMemory {
    known: BTreeMap<String, BTreeSet<String>>,
    completed: BTreeMap<String, BTreeSet<String>>,
    student_info: BTreeMap<String, Student>,
}

/// Per-student counts exposed to the presentation layer.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StudentSummary {
    pub name: String,
    pub known_assignments: usize,
    pub completed_assignments: usize,
    pub pending_assignments: usize,
}

impl TrackingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache display details for `students`. Entries are never pruned.
    pub fn remember_students(&mut self, students: &[Student]) {
        for student in students.iter().filter(|s| !s.id.is_empty()) {
            self.student_info.insert(student.id.clone(), student.clone());
        }
    }

    /// Cached details, or a placeholder named after the identifier.
    pub fn student(&self, student_id: &str) -> Student {
        self.student_info
            .get(student_id)
            .cloned()
            .unwrap_or_else(|| Student::placeholder(student_id))
    }

    /// Apply one cycle's correlated data and return the notifications it
    /// produces.
    ///
    /// Per student, new assignments are checked before completions, so an
    /// assignment first seen with a turned-in submission yields both events
    /// in the same cycle. Completion does not require the assignment to
    /// have been known before.
    pub fn detect_changes(
        &mut self,
        correlation: &Correlation,
        now: DateTime<Utc>,
    ) -> Vec<HomeworkEvent> {
        let mut events = Vec::new();

        for (student_id, assignments) in &correlation.assignments {
            let student = self.student(student_id);

            let known = self.known.entry(student_id.clone()).or_default();
            for (assignment_id, assignment) in assignments {
                if known.insert(assignment_id.clone()) {
                    info!(
                        student = %student.name,
                        assignment = %assignment.name,
                        course = %assignment.course_name,
                        "New homework appeared"
                    );
                    events.push(HomeworkEvent::Appeared(HomeworkAppeared::new(
                        &student, assignment, now,
                    )));
                }
            }

            let submissions = correlation.submissions.get(student_id);
            let completed = self.completed.entry(student_id.clone()).or_default();
            for (assignment_id, assignment) in assignments {
                if completed.contains(assignment_id) {
                    continue;
                }
                let Some(submission) = submissions.and_then(|s| s.get(assignment_id)) else {
                    continue;
                };
                if !submission.is_turned_in() {
                    continue;
                }
                completed.insert(assignment_id.clone());
                info!(
                    student = %student.name,
                    assignment = %assignment.name,
                    course = %assignment.course_name,
                    "Homework completed"
                );
                events.push(HomeworkEvent::Completed(HomeworkCompleted::new(
                    &student, assignment, submission, now,
                )));
            }
        }

        events
    }

    /// Drop identifiers that are no longer in this cycle's data.
    ///
    /// Every tracked student is checked. A student with no correlated
    /// assignments this cycle has an empty current set and loses all of
    /// their identifiers. Returns the number of identifiers removed.
    pub fn evict_stale(&mut self, correlation: &Correlation) -> usize {
        let mut evicted = 0;
        for sets in [&mut self.known, &mut self.completed] {
            for (student_id, ids) in sets.iter_mut() {
                let current = correlation.assignments.get(student_id);
                let before = ids.len();
                ids.retain(|id| current.is_some_and(|c| c.contains_key(id)));
                evicted += before - ids.len();
            }
        }
        if evicted > 0 {
            debug!(evicted, "Evicted stale assignment identifiers");
        }
        evicted
    }

    pub fn known(&self, student_id: &str) -> Option<&BTreeSet<String>> {
        self.known.get(student_id)
    }

    pub fn completed(&self, student_id: &str) -> Option<&BTreeSet<String>> {
        self.completed.get(student_id)
    }

    pub fn is_known(&self, student_id: &str, assignment_id: &str) -> bool {
        self.known(student_id)
            .is_some_and(|ids| ids.contains(assignment_id))
    }

    pub fn is_completed(&self, student_id: &str, assignment_id: &str) -> bool {
        self.completed(student_id)
            .is_some_and(|ids| ids.contains(assignment_id))
    }

    pub fn student_info(&self) -> &BTreeMap<String, Student> {
        &self.student_info
    }

    pub fn total_known(&self) -> usize {
        self.known.values().map(BTreeSet::len).sum()
    }

    pub fn total_completed(&self) -> usize {
        self.completed.values().map(BTreeSet::len).sum()
    }

    pub fn total_pending(&self) -> usize {
        self.total_known().saturating_sub(self.total_completed())
    }

    /// Counts for every cached student.
    pub fn summaries(&self) -> BTreeMap<String, StudentSummary> {
        self.student_info
            .iter()
            .map(|(id, student)| {
                let known = self.known.get(id).map_or(0, BTreeSet::len);
                let completed = self.completed.get(id).map_or(0, BTreeSet::len);
                let summary = StudentSummary {
                    name: student.name.clone(),
                    known_assignments: known,
                    completed_assignments: completed,
                    pending_assignments: known.saturating_sub(completed),
                };
                (id.clone(), summary)
            })
            .collect()
    }

    pub fn to_stored(&self, saved_at: DateTime<Utc>) -> StoredState {
        let as_lists = |sets: &BTreeMap<String, BTreeSet<String>>| {
            sets.iter()
                .map(|(id, ids)| (id.clone(), ids.iter().cloned().collect()))
                .collect()
        };
        StoredState {
            known_assignments: as_lists(&self.known),
            completed_assignments: as_lists(&self.completed),
            student_info: self.student_info.clone(),
            last_saved: saved_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn from_stored(state: StoredState) -> Self {
        let as_sets = |lists: BTreeMap<String, Vec<String>>| {
            lists
                .into_iter()
                .map(|(id, ids)| (id, ids.into_iter().collect()))
                .collect()
        };
        Self {
            known: as_sets(state.known_assignments),
            completed: as_sets(state.completed_assignments),
            student_info: state.student_info,
        }
    }
}
