//! Database repositories
//!
//! Repositories handle all direct database interactions. Services depend on
//! the store traits so they can be exercised without a database.

pub mod problem_repo;
pub mod submission_repo;

pub use problem_repo::{ProblemRepository, ProblemStore};
pub use submission_repo::{SubmissionRepository, SubmissionStore};

#[cfg(test)]
pub use problem_repo::MockProblemStore;
#[cfg(test)]
pub use submission_repo::MockSubmissionStore;
