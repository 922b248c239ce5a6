//! Main application state and service coordination
//!
//! This module contains the production AppState that owns the rating
//! engine, the metrics collector and the background tasks.

use crate::config::AppConfig;
use crate::metrics::MetricsCollector;
use crate::rating::RatingEngine;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// The rating graph and its operations, shared by all request handlers
    engine: Arc<RatingEngine>,

    /// Prometheus metrics
    metrics: Arc<MetricsCollector>,

    /// Background task handles
    background_tasks: Mutex<Vec<JoinHandle<()>>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    started_at: Instant,
}

impl AppState {
    /// Initialize the application with an empty rating graph
    pub fn new(config: AppConfig) -> Result<Self, ServiceError> {
        Self::with_engine(config, Arc::new(RatingEngine::new()))
    }

    /// Initialize the application around an existing engine
    pub fn with_engine(config: AppConfig, engine: Arc<RatingEngine>) -> Result<Self, ServiceError> {
        info!("Initializing tennis-rating service");

        crate::config::validate_config(&config).map_err(|e| ServiceError::Configuration {
            message: e.to_string(),
        })?;

        let metrics = Arc::new(MetricsCollector::new().map_err(|e| {
            ServiceError::Initialization {
                message: format!("Failed to create metrics collector: {}", e),
            }
        })?);

        Ok(Self {
            config,
            engine,
            metrics,
            background_tasks: Mutex::new(Vec::new()),
            is_running: Arc::new(RwLock::new(false)),
            started_at: Instant::now(),
        })
    }

    /// Mark the service running and start background tasks
    pub async fn start(&self) -> Result<(), ServiceError> {
        info!("Starting tennis-rating service");

        *self.is_running.write().await = true;
        self.start_background_tasks().await?;

        info!("✅ Tennis-rating service started successfully");
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of tennis-rating service");

        *self.is_running.write().await = false;
        self.stop_background_tasks().await;

        let final_stats = self
            .engine
            .stats()
            .map_err(|e| ServiceError::BackgroundTask {
                message: format!("Failed to get final stats: {}", e),
            })?;

        info!("Final rating graph statistics: {:?}", final_stats);
        info!("✅ Tennis-rating service shutdown completed");
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Get the rating engine
    pub fn engine(&self) -> Arc<RatingEngine> {
        self.engine.clone()
    }

    /// Get the metrics collector
    pub fn metrics(&self) -> Arc<MetricsCollector> {
        self.metrics.clone()
    }

    /// Seconds since the state was created
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Number of background tasks still running, and the number started
    pub async fn background_task_status(&self) -> (usize, usize) {
        let tasks = self.background_tasks.lock().await;
        let alive = tasks.iter().filter(|task| !task.is_finished()).count();
        (alive, tasks.len())
    }

    /// Start background maintenance tasks
    async fn start_background_tasks(&self) -> Result<(), ServiceError> {
        let refresh_interval = self.config.metrics_refresh_interval();
        info!(
            "Starting metrics refresh task ({}s interval)...",
            refresh_interval.as_secs()
        );

        let metrics_task = {
            let engine = self.engine.clone();
            let metrics = self.metrics.clone();
            let is_running = self.is_running.clone();
            let started_at = self.started_at;

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(refresh_interval);
                info!("Metrics refresh task started");

                while *is_running.read().await {
                    interval.tick().await;

                    metrics
                        .service()
                        .uptime_seconds
                        .set(started_at.elapsed().as_secs() as i64);

                    match engine.stats() {
                        Ok(stats) => {
                            debug!(
                                "Updating metrics - players: {}, edges: {}, matches: {}",
                                stats.players, stats.match_edges, stats.matches_recorded
                            );
                            metrics.update_from_engine_stats(&stats);
                            metrics.update_health_status(2);
                        }
                        Err(e) => {
                            warn!("Failed to read engine stats for metrics update: {}", e);
                            metrics.update_health_status(0);
                        }
                    }
                }

                info!("Metrics refresh task stopped");
            })
        };

        self.background_tasks.lock().await.push(metrics_task);

        info!("Background maintenance tasks started successfully");
        Ok(())
    }

    /// Stop all background tasks
    pub(crate) async fn stop_background_tasks(&self) {
        let tasks: Vec<_> = self.background_tasks.lock().await.drain(..).collect();
        let task_count = tasks.len();
        if task_count == 0 {
            info!("No background tasks to stop");
            return;
        }

        info!("Stopping {} background tasks...", task_count);
        for (i, task) in tasks.into_iter().enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MatchResult;

    #[tokio::test]
    async fn test_app_state_lifecycle() {
        let state = AppState::new(AppConfig::default()).unwrap();
        assert!(!state.is_running().await);

        state.start().await.unwrap();
        assert!(state.is_running().await);
        assert_eq!(state.background_task_status().await, (1, 1));

        state.shutdown().await.unwrap();
        assert!(!state.is_running().await);
        assert_eq!(state.background_task_status().await, (0, 0));
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let mut config = AppConfig::default();
        config.service.http_port = 0;

        let result = AppState::new(config);
        assert!(matches!(result, Err(ServiceError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_shared_engine() {
        let engine = Arc::new(RatingEngine::new());
        let state = AppState::with_engine(AppConfig::default(), engine.clone()).unwrap();

        state
            .engine()
            .record_match(&MatchResult::new("a", "b", 10.0, 10.0, 6))
            .unwrap();
        assert_eq!(engine.stats().unwrap().players, 2);
    }
}
