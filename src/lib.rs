//! Skycast Library
//!
//! This module exposes the cache, data, service and web modules for use in
//! integration tests and by the `skycast` binary.

pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod service;
pub mod web;
