//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep transport layers decoupled from storage details.

pub mod budget_service;
pub mod leave_service;
pub mod notification_service;
pub mod participation_service;
