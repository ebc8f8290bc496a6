//! Core domain types and utilities for the listkeeper platform.
//!
//! This crate provides the foundational identifier types and the shared
//! `Result` alias used throughout the listkeeper to-do list service.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{CommentId, ListId, ParseIdError, RoleAssignmentId, TagId, TaskId, UserId};
