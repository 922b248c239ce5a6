//! Metrics and monitoring for the tennis-rating service
//!
//! This module provides Prometheus metrics collection for rating engine
//! activity, graph size, and request performance.

pub mod collector;

pub use collector::{
    GraphMetrics, MetricsCollector, MetricsTimer, PerformanceMetrics, RatingMetrics,
    ServiceMetrics,
};

use prometheus::{Encoder, TextEncoder};

/// Render all metrics in the Prometheus text exposition format
pub fn encode_metrics(collector: &MetricsCollector) -> anyhow::Result<(String, String)> {
    let metric_families = collector.registry().gather();
    let encoder = TextEncoder::new();

    let text = encoder
        .encode_to_string(&metric_families)
        .map_err(|e| anyhow::anyhow!("Failed to encode metrics: {}", e))?;

    Ok((text, encoder.format_type().to_string()))
}
