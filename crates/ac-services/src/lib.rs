//! # ac-services
//!
//! Business logic sitting between the HTTP layer and the storage ports.

pub mod board_service;
pub mod submission;
pub mod thread_service;

pub use board_service::{BoardPage, BoardService};
pub use submission::{PostingRules, SubmissionError, ThreadSubmission, Upload};
pub use thread_service::ThreadService;
