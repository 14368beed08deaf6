//! Charge attempt/success counters.

use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

pub const ATTEMPTS_METRIC: &str = "processors_stripe_charge_attempts";
pub const SUCCESSES_METRIC: &str = "processors_stripe_charge_successes";

/// Process-wide charge counters, constructed once and handed to the service.
#[derive(Clone)]
pub struct ChargeMetrics {
    registry: Registry,
    attempts: IntCounter,
    successes: IntCounter,
}

impl ChargeMetrics {
    /// Creates the counters in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        Self::with_registry(Registry::new())
    }

    /// Creates the counters and registers them with an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, prometheus::Error> {
        let attempts = IntCounter::with_opts(Opts::new(
            ATTEMPTS_METRIC,
            "Number of attempted charges",
        ))?;
        let successes = IntCounter::with_opts(Opts::new(
            SUCCESSES_METRIC,
            "Number of successful charges",
        ))?;
        registry.register(Box::new(attempts.clone()))?;
        registry.register(Box::new(successes.clone()))?;
        Ok(Self {
            registry,
            attempts,
            successes,
        })
    }

    pub fn record_attempt(&self) {
        self.attempts.inc();
    }

    pub fn record_success(&self) {
        self.successes.inc();
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.get()
    }

    pub fn successes(&self) -> u64 {
        self.successes.get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Renders every metric in the registry in the Prometheus text format.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
