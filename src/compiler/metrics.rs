use crate::error::ConfigError;
use prometheus::{Histogram, HistogramOpts, IntCounter, Opts, Registry};
use std::time::Duration;

pub const COMPILATIONS_SUCCEEDED_TOTAL: &str = "flowroute_compilations_succeeded_total";
pub const COMPILATIONS_FAILED_TOTAL: &str = "flowroute_compilations_failed_total";
pub const COMPILATION_DURATION_SECONDS: &str = "flowroute_compilation_duration_seconds";

/// Success, failure and latency of `MultiHopCompiler::compile`.
///
/// Each compiler owns its own collectors. They are only exported when a registry
/// is handed to the compiler builder.
#[derive(Debug, Clone)]
pub struct CompilerMetrics {
    succeeded: IntCounter,
    failed: IntCounter,
    duration: Histogram,
}

impl CompilerMetrics {
    pub fn new() -> Result<Self, ConfigError> {
        let metric_err = |e: prometheus::Error| ConfigError::Metrics(e.to_string());
        let succeeded = IntCounter::with_opts(Opts::new(
            COMPILATIONS_SUCCEEDED_TOTAL,
            "Flow specs compiled into a physical plan",
        ))
        .map_err(metric_err)?;
        let failed = IntCounter::with_opts(Opts::new(
            COMPILATIONS_FAILED_TOTAL,
            "Flow specs that could not be compiled",
        ))
        .map_err(metric_err)?;
        let duration = Histogram::with_opts(
            HistogramOpts::new(
                COMPILATION_DURATION_SECONDS,
                "Time spent compiling a flow spec (seconds)",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
            ]),
        )
        .map_err(metric_err)?;
        Ok(Self {
            succeeded,
            failed,
            duration,
        })
    }

    /// Registers every collector with `registry`.
    pub fn register(&self, registry: &Registry) -> Result<(), ConfigError> {
        let metric_err = |e: prometheus::Error| ConfigError::Metrics(e.to_string());
        registry
            .register(Box::new(self.succeeded.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(self.failed.clone()))
            .map_err(metric_err)?;
        registry
            .register(Box::new(self.duration.clone()))
            .map_err(metric_err)?;
        Ok(())
    }

    pub(crate) fn record_success(&self, elapsed: Duration) {
        self.succeeded.inc();
        self.duration.observe(elapsed.as_secs_f64());
    }

    pub(crate) fn record_failure(&self) {
        self.failed.inc();
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.get()
    }

    pub fn failed(&self) -> u64 {
        self.failed.get()
    }

    /// Number of latency samples recorded.
    pub fn duration_samples(&self) -> u64 {
        self.duration.get_sample_count()
    }
}
