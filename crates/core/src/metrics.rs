//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Conversions (per trigger kind and result)
//! - Remote downloads (files and bytes)
//! - Piece hashing

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Conversion Metrics
// =============================================================================

/// Conversions total by trigger and result.
pub static CONVERSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("driveseed_conversions_total", "Total conversions"),
        &["trigger", "result"], // trigger: "link", "upload"; result: "success" or an error kind
    )
    .unwrap()
});

/// Conversion duration in seconds.
pub static CONVERSION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "driveseed_conversion_duration_seconds",
            "Duration of a conversion from trigger to artifact",
        )
        .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 60.0, 300.0, 900.0, 3600.0]),
        &["trigger"],
    )
    .unwrap()
});

// =============================================================================
// Remote Download Metrics
// =============================================================================

/// Remote files downloaded.
pub static REMOTE_FILES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "driveseed_remote_files_downloaded_total",
        "Total files downloaded from remote storage",
    )
    .unwrap()
});

/// Remote bytes downloaded.
pub static REMOTE_BYTES_DOWNLOADED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "driveseed_remote_bytes_downloaded_total",
        "Total bytes downloaded from remote storage",
    )
    .unwrap()
});

// =============================================================================
// Torrent Metrics
// =============================================================================

/// Piece hashing duration in seconds.
pub static HASHING_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "driveseed_hashing_duration_seconds",
            "Duration of piece hashing per artifact",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0, 600.0]),
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CONVERSIONS_TOTAL.clone()),
        Box::new(CONVERSION_DURATION.clone()),
        Box::new(REMOTE_FILES_DOWNLOADED.clone()),
        Box::new(REMOTE_BYTES_DOWNLOADED.clone()),
        Box::new(HASHING_DURATION.clone()),
    ]
}
