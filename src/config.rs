//! Tunables for the Remote Store, gathered into one constructor-time surface
//! instead of scattered magic numbers.

use std::time::Duration;

/// Exponential backoff parameters handed to stream implementations.
///
/// The Remote Store core does not implement a retry schedule itself (§1
/// Non-goals: "backoff schedules beyond the hook exposed by streams") — this
/// only configures the hook a stream uses when it decides to reconnect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffConfig {
    pub initial_delay: Duration,
    pub backoff_factor: f64,
    pub max_delay: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(1000),
            backoff_factor: 1.5,
            max_delay: Duration::from_secs(60),
        }
    }
}

impl BackoffConfig {
    /// The jittered delay before the `attempt`-th reconnect (0-indexed), for
    /// a stream implementation's own retry loop. Not called by the Remote
    /// Store core itself (§1 Non-goals), which only hands this config to the
    /// stream at construction time.
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.next_delay_with_rng(attempt, &mut rand::thread_rng())
    }

    fn next_delay_with_rng<R: rand::Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        let base = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(attempt as i32);
        let jittered = base * rng.gen_range(0.5..=1.0);
        Duration::from_secs_f64(jittered.min(self.max_delay.as_secs_f64()))
    }
}

/// Construction-time tunables for [`crate::remote::RemoteStore`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RemoteStoreConfig {
    /// §3/§4.5 `MAX_PENDING_WRITES`.
    pub max_pending_writes: usize,
    /// §4.1 `FAILURE_THRESHOLD`.
    pub online_state_failure_threshold: u32,
    /// Backoff configuration passed through to stream implementations.
    pub backoff: BackoffConfig,
}

impl Default for RemoteStoreConfig {
    fn default() -> Self {
        Self {
            max_pending_writes: 10,
            online_state_failure_threshold: 2,
            backoff: BackoffConfig::default(),
        }
    }
}

impl RemoteStoreConfig {
    pub fn builder() -> RemoteStoreConfigBuilder {
        RemoteStoreConfigBuilder::default()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct RemoteStoreConfigBuilder {
    config: OptionalFields,
}

#[derive(Clone, Copy, Debug, Default)]
struct OptionalFields {
    max_pending_writes: Option<usize>,
    online_state_failure_threshold: Option<u32>,
    backoff: Option<BackoffConfig>,
}

impl RemoteStoreConfigBuilder {
    pub fn max_pending_writes(mut self, value: usize) -> Self {
        self.config.max_pending_writes = Some(value);
        self
    }

    pub fn online_state_failure_threshold(mut self, value: u32) -> Self {
        self.config.online_state_failure_threshold = Some(value);
        self
    }

    pub fn backoff(mut self, value: BackoffConfig) -> Self {
        self.config.backoff = Some(value);
        self
    }

    pub fn build(self) -> RemoteStoreConfig {
        let defaults = RemoteStoreConfig::default();
        RemoteStoreConfig {
            max_pending_writes: self.config.max_pending_writes.unwrap_or(defaults.max_pending_writes),
            online_state_failure_threshold: self
                .config
                .online_state_failure_threshold
                .unwrap_or(defaults.online_state_failure_threshold),
            backoff: self.config.backoff.unwrap_or(defaults.backoff),
        }
    }
}
