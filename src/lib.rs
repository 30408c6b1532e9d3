//! Songbrowser - search the iTunes catalog for songs by artist
//!
//! This library turns free text into iTunes search requests, decodes the
//! results and keeps the query and the displayed songs in an explicit state
//! that a front end can drive.

/// Query state and the background search driver
pub mod browser;
/// Client modules for the search API
pub mod clients;
/// Settings from the builder, the environment and defaults
pub mod config;
