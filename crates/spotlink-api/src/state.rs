//! Application state management
//!
//! Author: hephaex@gmail.com

use spotlink_core::AppConfig;
use spotlink_extractor::AnnotationPipeline;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Annotation pipeline serving every request
    pub pipeline: Arc<AnnotationPipeline>,
    /// Server start time
    pub start_time: Instant,
    /// Annotation request counter
    pub request_count: AtomicU64,
    /// Cancelled on shutdown; in-flight linker retries stop waiting
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, pipeline: AnnotationPipeline) -> Self {
        Self {
            config,
            pipeline: Arc::new(pipeline),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        }
    }

    /// State backed by DBpedia Spotlight as configured
    pub fn from_config(config: AppConfig) -> spotlink_core::Result<Self> {
        let pipeline = AnnotationPipeline::from_config(&config)?;
        Ok(Self::new(config, pipeline))
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
