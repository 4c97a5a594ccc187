//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate registry calls into use-case level APIs.
//! - Keep the shell decoupled from storage details.

pub mod instance_service;
