//! Google Tasks to Tasks.org converter library
//!
//! This module exports the core components for testing and integration.

pub mod cli;
pub mod config;
pub mod convert;
pub mod diff;
pub mod error;
pub mod events;
pub mod google_tasks;
pub mod io;
pub mod merge;
pub mod tasks_org;
pub mod transform;
