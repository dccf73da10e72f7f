//! Fixed-shape records for the Canvas entities Homeroom works with.
//!
//! Every upstream payload is normalized into one of these types at the
//! connector boundary, so engine code never deals with missing fields.

pub mod assignment;
pub mod course;
pub mod student;
pub mod submission;

pub use assignment::Assignment;
pub use course::{Course, Enrollment};
pub use student::Student;
pub use submission::{Submission, WorkflowState};
