//! services/api/src/lib.rs
//!
//! The study planner HTTP service: configuration, the Postgres adapter and the
//! axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
