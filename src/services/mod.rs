//! Business logic services

pub mod auth_service;
pub mod judge_service;
pub mod problem_service;

pub use auth_service::AuthService;
pub use judge_service::JudgeService;
pub use problem_service::ProblemService;
