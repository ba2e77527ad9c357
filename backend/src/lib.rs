//! # Segment Insights
//!
//! Aggregation engine behind a customer-segment analytics dashboard.
//!
//! Survey respondents are plotted on a 2-D embedding and grouped into
//! clusters. This crate turns those rows into the numbers every panel shows,
//! and exposes them over a REST API.
//!
//! ## Features
//!
//! - **Normalization**: drop rows that cannot be placed on the scatter plot
//! - **Scoping**: model, cluster and state filters with per-panel locks
//! - **Breakdowns**: categorical distributions and financing averages
//! - **Attitudes**: "percent agree" under field-specific agreement sets
//! - **Price histogram**: fixed $5k bins between $30k and $110k
//! - **State map**: state resolution from codes, names and abbreviations
//! - **Market simulator**: constant-elasticity demand and KPI solving
//! - **HTTP API**: axum endpoints over an in-memory dataset repository
//!
//! ## Architecture
//!
//! - [`models`]: raw and normalized rows, code lookups, field catalog
//! - [`transformations`]: normalization and scope filters
//! - [`services`]: the aggregation engine and market solver
//! - [`db`]: dataset repository and ingestion service layer
//! - [`io`]: JSON loaders with path-aware errors
//! - [`config`]: TOML configuration of the server
//! - [`http`]: axum router and handlers (feature `http-server`)

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod config;
pub mod db;
pub mod io;
pub mod models;
pub mod services;
pub mod transformations;

#[cfg(feature = "http-server")]
pub mod http;
