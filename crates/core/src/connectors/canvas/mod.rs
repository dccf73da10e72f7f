pub mod client;
pub mod mapper;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::CanvasConfig;
use crate::connectors::LmsConnector;
use crate::error::Result;
use crate::models::{Assignment, Course, Student, Submission};

use self::client::CanvasClient;
use self::mapper::CanvasMapper;

/// Canvas LMS connector for an observer (parent/guardian) account.
pub struct CanvasConnector {
    client: CanvasClient,
}

impl CanvasConnector {
    pub fn new(config: &CanvasConfig) -> Result<Self> {
        let client = CanvasClient::new(&config.base_url, &config.token, config.per_page)?;
        Ok(Self { client })
    }

    /// Create from a pre-built client (useful for testing).
    pub fn from_client(client: CanvasClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LmsConnector for CanvasConnector {
    async fn list_students(&self) -> Result<Vec<Student>> {
        let raw = self
            .client
            .get_list("/api/v1/users/self/observees", &[])
            .await?;
        let students = CanvasMapper::students(raw);
        debug!(count = students.len(), "Fetched observees");
        Ok(students)
    }

    async fn list_courses(&self, student_id: &str) -> Result<Vec<Course>> {
        let raw = self
            .client
            .get_list(
                &format!("/api/v1/users/{student_id}/courses"),
                &[("include[]", "term")],
            )
            .await?;
        let courses = CanvasMapper::courses(raw);
        debug!(student_id = %student_id, count = courses.len(), "Fetched courses");
        Ok(courses)
    }

    async fn list_assignments(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Vec<Assignment>> {
        let raw = self
            .client
            .get_list(
                &format!("/api/v1/users/{student_id}/courses/{course_id}/assignments"),
                &[],
            )
            .await?;
        let assignments = CanvasMapper::assignments(raw);
        debug!(
            student_id = %student_id,
            course_id = %course_id,
            count = assignments.len(),
            "Fetched assignments"
        );
        Ok(assignments)
    }

    async fn list_submissions(
        &self,
        student_id: &str,
        course_id: &str,
    ) -> Result<Vec<Submission>> {
        let raw = self
            .client
            .get_list(
                &format!("/api/v1/courses/{course_id}/students/submissions"),
                &[("student_ids[]", student_id)],
            )
            .await?;
        let submissions = CanvasMapper::submissions(raw);
        debug!(
            student_id = %student_id,
            course_id = %course_id,
            count = submissions.len(),
            "Fetched submissions"
        );
        Ok(submissions)
    }

    async fn test_connection(&self) -> Result<()> {
        info!("Testing Canvas connection");
        self.client.get_one("/api/v1/users/self").await?;
        info!("Canvas connection test successful");
        Ok(())
    }

    fn provider_name(&self) -> &str {
        "canvas"
    }
}
