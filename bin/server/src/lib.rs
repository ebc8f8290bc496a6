//! listkeeper REST API server.
//!
//! This crate provides the axum router, PostgreSQL repositories, and the
//! bearer-token gate for the listkeeper to-do list service.

pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
