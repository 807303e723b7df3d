use crate::rand::Rand;
use crate::time::Duration;

/// Initial retransmission interval for router solicitations (RFC 7559).
pub const DEFAULT_INITIAL_INTERVAL: Duration = Duration::from_secs(4);
/// Maximum retransmission interval for router solicitations (RFC 7559).
pub const DEFAULT_MAX_INTERVAL: Duration = Duration::from_secs(3600);

/// Retransmission configuration.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct RetransmitConfig {
    /// The first solicitation is repeated after this long, give or take 10%.
    pub initial_interval: Duration,
    /// Intervals stop doubling once they would exceed this, give or take 10%.
    pub max_interval: Duration,
}

impl Default for RetransmitConfig {
    fn default() -> Self {
        Self {
            initial_interval: DEFAULT_INITIAL_INTERVAL,
            max_interval: DEFAULT_MAX_INTERVAL,
        }
    }
}

/// Progress of one soliciting cycle.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Default)]
pub struct BackoffState {
    /// The delay drawn for the currently armed retransmission, zero before
    /// the first one.
    pub previous_delay: Duration,
    /// Number of retransmission timer firings in this cycle.
    pub attempt_count: u32,
}

impl BackoffState {
    pub const fn new() -> BackoffState {
        BackoffState {
            previous_delay: Duration::ZERO,
            attempt_count: 0,
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = BackoffState::new();
    }

    pub(crate) fn record_attempt(&mut self) {
        self.attempt_count = self.attempt_count.saturating_add(1);
    }

    /// Draw the delay until the next retransmission and remember it.
    pub(crate) fn next_delay(&mut self, config: &RetransmitConfig, rand: &mut Rand) -> Duration {
        let delay = next_delay(config, self.previous_delay, rand);
        self.previous_delay = delay;
        delay
    }
}

/// Compute a retransmission delay from the previous one.
///
/// * no previous delay: `IRT ± IRT/10`
/// * `2·prev <= MRT`: `2·prev ± prev/10`
/// * otherwise: `MRT ± MRT/10`
///
/// The jitter is drawn uniformly from the closed interval.
pub(crate) fn next_delay(config: &RetransmitConfig, previous: Duration, rand: &mut Rand) -> Duration {
    let (base, spread) = if previous.is_zero() {
        (config.initial_interval, config.initial_interval / 10)
    } else if previous * 2 > config.max_interval {
        (config.max_interval, config.max_interval / 10)
    } else {
        (previous * 2, previous / 10)
    };

    let low = base.total_micros() - spread.total_micros();
    let high = base.total_micros().saturating_add(spread.total_micros());
    Duration::from_micros(rand.rand_range_inclusive(low, high))
}
