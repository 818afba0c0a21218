//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce input validation and authorization checks above the
//!   persistence boundary.
//! - Keep request-handling layers decoupled from storage details.

pub mod board_service;
pub mod bootstrap;
pub mod journal_service;
pub mod task_service;
