#![deny(missing_docs)]

//! Core library for the vidseg lecture segmentation service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Segmentation run counters.
pub mod metrics;
/// Indexing, polling, analysis, and segment extraction.
pub mod pipeline;
/// Client for the remote video-understanding service.
pub mod twelvelabs;
