pub mod canvas;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Assignment, Course, Student, Submission};

/// Trait for learning-management-system connector implementations.
///
/// Each list call returns already-normalized records. Transport and
/// authentication failures are returned as errors and abort the poll
/// that issued them.
#[async_trait]
pub trait LmsConnector: Send + Sync {
    async fn list_students(&self) -> Result<Vec<Student>>;
    async fn list_courses(&self, student_id: &str) -> Result<Vec<Course>>;
    async fn list_assignments(&self, student_id: &str, course_id: &str)
        -> Result<Vec<Assignment>>;
    async fn list_submissions(&self, student_id: &str, course_id: &str)
        -> Result<Vec<Submission>>;
    async fn test_connection(&self) -> Result<()>;
    fn provider_name(&self) -> &str;
}
