//! Classroom client library
//!
//! Content sync, permissions, attachment locks and grade reports for
//! the classroom service, exposed for the CLI and for testing.

pub mod app;
pub mod commands;
pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod remote;
pub mod services;
pub mod storage;
pub mod text;
