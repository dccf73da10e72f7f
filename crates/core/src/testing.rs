//! Shared fixtures for unit tests: an in-memory LMS and record builders.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::connectors::LmsConnector;
use crate::error::{HomeroomError, Result};
use crate::models::assignment::UNKNOWN_COURSE;
use crate::models::{Assignment, Course, Enrollment, Student, Submission, WorkflowState};
use crate::store::{StateStore, StoredState};

pub(crate) fn student(id: &str, name: &str) -> Student {
    Student {
        id: id.into(),
        name: name.into(),
        short_name: name.split_whitespace().next().unwrap_or(name).into(),
        sortable_name: name.into(),
    }
}

pub(crate) fn course(id: &str, name: &str, owner: &str) -> Course {
    Course {
        id: id.into(),
        name: name.into(),
        enrollments: vec![Enrollment {
            user_id: Some(owner.into()),
            enrollment_type: Some("StudentEnrollment".into()),
            enrollment_state: Some("active".into()),
        }],
    }
}

pub(crate) fn assignment(id: &str, course_id: &str, name: &str) -> Assignment {
    Assignment {
        id: id.into(),
        name: name.into(),
        course_id: course_id.into(),
        course_name: UNKNOWN_COURSE.into(),
        due_at: Some("2024-01-15T23:59:00Z".into()),
        points_possible: Some(10.0),
        html_url: Some(format!("https://canvas.test/courses/{course_id}/assignments/{id}")),
    }
}

pub(crate) fn submission(assignment_id: &str, state: &str, submitted_at: Option<&str>) -> Submission {
    Submission {
        assignment_id: assignment_id.into(),
        workflow_state: WorkflowState::from(state.to_string()),
        submitted_at: submitted_at.map(str::to_string),
        score: Some(9.0),
        grade: Some("A".into()),
    }
}

/// What the mock LMS answers with. Keys are `(student_id, course_id)`.
#[derive(Debug, Default, Clone)]
pub(crate) struct MockData {
    pub students: Vec<Student>,
    pub courses: HashMap<String, Vec<Course>>,
    pub assignments: HashMap<(String, String), Vec<Assignment>>,
    pub submissions: HashMap<(String, String), Vec<Submission>>,
    pub course_delays_ms: HashMap<String, u64>,
    pub fail_with: Option<String>,
}

impl MockData {
    pub fn with_student(mut self, s: Student) -> Self {
        self.students.push(s);
        self
    }

    pub fn with_course(mut self, c: Course) -> Self {
        let owner = c.owner().unwrap_or_default().to_string();
        self.courses.entry(owner).or_default().push(c);
        self
    }

    pub fn with_assignment(mut self, student_id: &str, a: Assignment) -> Self {
        self.assignments
            .entry((student_id.into(), a.course_id.clone()))
            .or_default()
            .push(a);
        self
    }

    pub fn with_submission(mut self, student_id: &str, course_id: &str, s: Submission) -> Self {
        self.submissions
            .entry((student_id.into(), course_id.into()))
            .or_default()
            .push(s);
        self
    }
}

/// In-memory [`LmsConnector`] that records call counts and peak concurrency.
#[derive(Default)]
pub(crate) struct MockLms {
    data: Mutex<MockData>,
    pub calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub peak_in_flight: AtomicUsize,
}

impl MockLms {
    pub fn new(data: MockData) -> Self {
        Self {
            data: Mutex::new(data),
            ..Default::default()
        }
    }

    pub fn update(&self, f: impl FnOnce(&mut MockData)) {
        let mut data = self.data.lock().unwrap();
        f(&mut data);
    }

    fn snapshot(&self) -> Result<MockData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap().clone();
        match &data.fail_with {
            Some(message) => Err(HomeroomError::Upstream(message.clone())),
            None => Ok(data),
        }
    }

    async fn track<T>(&self, course_id: &str, data: &MockData, value: T) -> T {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = data.course_delays_ms.get(course_id).copied().unwrap_or(1);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        value
    }
}

#[async_trait]
impl LmsConnector for MockLms {
    async fn list_students(&self) -> Result<Vec<Student>> {
        Ok(self.snapshot()?.students)
    }

    async fn list_courses(&self, student_id: &str) -> Result<Vec<Course>> {
        let data = self.snapshot()?;
        let courses = data.courses.get(student_id).cloned().unwrap_or_default();
        Ok(self.track("", &data, courses).await)
    }

    async fn list_assignments(&self, student_id: &str, course_id: &str) -> Result<Vec<Assignment>> {
        let data = self.snapshot()?;
        let key = (student_id.to_string(), course_id.to_string());
        let assignments = data.assignments.get(&key).cloned().unwrap_or_default();
        Ok(self.track(course_id, &data, assignments).await)
    }

    async fn list_submissions(&self, student_id: &str, course_id: &str) -> Result<Vec<Submission>> {
        let data = self.snapshot()?;
        let key = (student_id.to_string(), course_id.to_string());
        let submissions = data.submissions.get(&key).cloned().unwrap_or_default();
        Ok(self.track(course_id, &data, submissions).await)
    }

    async fn test_connection(&self) -> Result<()> {
        self.snapshot().map(|_| ())
    }

    fn provider_name(&self) -> &str {
        "mock_lms"
    }
}

/// In-memory [`StateStore`] with switchable failures.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub state: Mutex<Option<StoredState>>,
    pub loads: AtomicUsize,
    pub saves: AtomicUsize,
    pub fail_load: bool,
    pub fail_save: bool,
}

impl MemoryStore {
    pub fn with_state(state: StoredState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
            ..Default::default()
        }
    }

    pub fn stored(&self) -> Option<StoredState> {
        self.state.lock().unwrap().clone()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredState>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        if self.fail_load {
            return Err(HomeroomError::Storage("disk on fire".into()));
        }
        Ok(self.stored())
    }

    async fn save(&self, state: &StoredState) -> Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        if self.fail_save {
            return Err(HomeroomError::Storage("read-only filesystem".into()));
        }
        *self.state.lock().unwrap() = Some(state.clone());
        Ok(())
    }
}
