//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep the CLI and other front ends decoupled from storage details.

pub mod alert_service;
pub mod ledger_service;
pub mod person_service;
pub mod resource_service;
pub mod shelter_service;
