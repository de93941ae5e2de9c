//! # Prospect Common Library
//!
//! Shared code for the prospecting statistics workspace:
//! - Door status taxonomy and its effect on aggregate counters
//! - Database schema, row models and queries
//! - Door event bus
//! - Configuration loading
//! - Utility functions

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod status;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
pub use status::{CounterContribution, DoorStatus, StatusMetadata};
