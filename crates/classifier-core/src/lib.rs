//! Core types and utilities for the transfer-learning classifier trainer.
//!
//! This crate provides the foundational types, configuration structures,
//! and utilities used across the classifier trainer workspace.

pub mod backend;
pub mod cli;
pub mod config;
pub mod error;
pub mod types;

pub use config::TrainingOptions;
pub use error::{Result, TrainerError};
pub use types::*;
