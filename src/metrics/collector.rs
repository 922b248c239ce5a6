//! Metrics collection using Prometheus
//!
//! This module provides metrics collection for the tennis-rating service
//! using Prometheus metrics.

use crate::rating::{EngineStats, MatchOutcome};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the rating service
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Rating engine activity
    rating_metrics: RatingMetrics,

    /// Graph size
    graph_metrics: GraphMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// API requests by endpoint and response status
    pub http_requests_total: IntCounterVec,
}

/// Rating engine activity metrics
#[derive(Clone)]
pub struct RatingMetrics {
    /// Total matches applied to the graph
    pub matches_recorded_total: IntCounter,

    /// Total ratings reduced by propagation
    pub propagation_adjustments_total: IntCounter,

    /// Estimations by outcome (mutual_opponents, direct, not_found)
    pub estimations_total: IntCounterVec,

    /// Requests rejected by validation, by endpoint
    pub rejected_requests_total: IntCounterVec,

    /// Distribution of per-match rating changes
    pub rating_change: Histogram,
}

/// Graph size metrics
#[derive(Clone)]
pub struct GraphMetrics {
    /// Number of rated players
    pub players: IntGauge,

    /// Number of recorded match edges
    pub match_edges: IntGauge,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Time spent applying a match, including propagation
    pub update_duration: Histogram,

    /// Time spent estimating an unplayed match
    pub estimation_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let rating_metrics = RatingMetrics::new(&registry)?;
        let graph_metrics = GraphMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            rating_metrics,
            graph_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get rating metrics
    pub fn rating(&self) -> &RatingMetrics {
        &self.rating_metrics
    }

    /// Get graph metrics
    pub fn graph(&self) -> &GraphMetrics {
        &self.graph_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Update graph gauges from engine stats
    pub fn update_from_engine_stats(&self, stats: &EngineStats) {
        self.graph_metrics.players.set(stats.players as i64);
        self.graph_metrics.match_edges.set(stats.match_edges as i64);
    }

    /// Record a match applied by the engine
    pub fn record_match(&self, outcome: &MatchOutcome, duration: Duration) {
        self.rating_metrics.matches_recorded_total.inc();
        self.rating_metrics
            .propagation_adjustments_total
            .inc_by(outcome.propagated_to.len() as u64);
        self.rating_metrics
            .rating_change
            .observe(outcome.calculation.rating_change);

        self.performance_metrics
            .update_duration
            .observe(duration.as_secs_f64());
    }

    /// Record an estimation; `outcome` is one of mutual_opponents, direct, not_found
    pub fn record_estimation(&self, outcome: &str, duration: Duration) {
        self.rating_metrics
            .estimations_total
            .with_label_values(&[outcome])
            .inc();

        self.performance_metrics
            .estimation_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a request rejected before reaching the engine
    pub fn record_rejection(&self, endpoint: &str) {
        self.rating_metrics
            .rejected_requests_total
            .with_label_values(&[endpoint])
            .inc();
    }

    /// Record an API request
    pub fn record_request(&self, endpoint: &str, status: u16) {
        let status = status.to_string();
        self.service_metrics
            .http_requests_total
            .with_label_values(&[endpoint, status.as_str()])
            .inc();
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("tennis_rating_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "tennis_rating_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("tennis_rating_http_requests_total", "Total API requests"),
            &["endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            http_requests_total,
        })
    }
}

impl RatingMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let matches_recorded_total = IntCounter::new(
            "tennis_rating_matches_recorded_total",
            "Total matches applied to the rating graph",
        )?;
        registry.register(Box::new(matches_recorded_total.clone()))?;

        let propagation_adjustments_total = IntCounter::new(
            "tennis_rating_propagation_adjustments_total",
            "Total ratings reduced by propagation",
        )?;
        registry.register(Box::new(propagation_adjustments_total.clone()))?;

        let estimations_total = IntCounterVec::new(
            Opts::new(
                "tennis_rating_estimations_total",
                "Total unplayed-match estimations",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(estimations_total.clone()))?;

        let rejected_requests_total = IntCounterVec::new(
            Opts::new(
                "tennis_rating_rejected_requests_total",
                "Total requests rejected by validation",
            ),
            &["endpoint"],
        )?;
        registry.register(Box::new(rejected_requests_total.clone()))?;

        let rating_change = Histogram::with_opts(
            HistogramOpts::new(
                "tennis_rating_rating_change",
                "Rating points moved per recorded match",
            )
            .buckets(vec![0.25, 0.5, 1.0, 2.0, 3.0, 5.0, 7.5, 10.0, 15.0]),
        )?;
        registry.register(Box::new(rating_change.clone()))?;

        Ok(Self {
            matches_recorded_total,
            propagation_adjustments_total,
            estimations_total,
            rejected_requests_total,
            rating_change,
        })
    }
}

impl GraphMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let players = IntGauge::new("tennis_rating_players", "Number of rated players")?;
        registry.register(Box::new(players.clone()))?;

        let match_edges = IntGauge::new(
            "tennis_rating_match_edges",
            "Number of recorded winner-loser pairs",
        )?;
        registry.register(Box::new(match_edges.clone()))?;

        Ok(Self {
            players,
            match_edges,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let update_duration = Histogram::with_opts(HistogramOpts::new(
            "tennis_rating_update_duration_seconds",
            "Time to apply a match including propagation",
        ))?;
        registry.register(Box::new(update_duration.clone()))?;

        let estimation_duration = Histogram::with_opts(HistogramOpts::new(
            "tennis_rating_estimation_duration_seconds",
            "Time to estimate an unplayed match",
        ))?;
        registry.register(Box::new(estimation_duration.clone()))?;

        Ok(Self {
            update_duration,
            estimation_duration,
        })
    }
}
