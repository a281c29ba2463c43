//! Sampled execution for digital controllers.
//!
//! A controller sampled at period `dt` updates only at `dt, 2*dt, ...` and
//! holds its output in between (zero-order hold), independent of the
//! exchange step the simulator uses.

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Relative slack when comparing a step time against the next sample time,
/// so that accumulated float error does not skip a sample.
const SAMPLE_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SampleConfig {
    /// Sample period in seconds.
    pub dt: f64,
}

impl SampleConfig {
    pub fn new(dt: f64) -> ModelResult<Self> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "sample period must be positive",
            });
        }
        Ok(Self { dt })
    }

    pub fn from_frequency(freq_hz: f64) -> ModelResult<Self> {
        if !(freq_hz.is_finite() && freq_hz > 0.0) {
            return Err(ModelError::InvalidArg {
                what: "sample frequency must be positive",
            });
        }
        Ok(Self { dt: 1.0 / freq_hz })
    }

    pub fn frequency(&self) -> f64 {
        1.0 / self.dt
    }
}

/// Tracks when the next sample is due.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleClock {
    pub config: SampleConfig,
    pub next_sample_time: f64,
}

impl SampleClock {
    pub fn new(config: SampleConfig, initial_time: f64) -> Self {
        Self {
            config,
            next_sample_time: initial_time + config.dt,
        }
    }

    pub fn should_sample(&self, current_time: f64) -> bool {
        current_time >= self.next_sample_time - SAMPLE_SLACK * self.config.dt
    }

    /// Move past `current_time`. Samples missed by a long step are dropped.
    pub fn advance(&mut self, current_time: f64) {
        while self.should_sample(current_time) {
            self.next_sample_time += self.config.dt;
        }
    }

    pub fn reset(&mut self, current_time: f64) {
        self.next_sample_time = current_time + self.config.dt;
    }

    pub fn time_until_sample(&self, current_time: f64) -> f64 {
        (self.next_sample_time - current_time).max(0.0)
    }
}

/// Holds the last sampled value between samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroOrderHold {
    pub value: f64,
    pub clock: SampleClock,
}

impl ZeroOrderHold {
    pub fn new(config: SampleConfig, initial_time: f64, initial_value: f64) -> Self {
        Self {
            value: initial_value,
            clock: SampleClock::new(config, initial_time),
        }
    }

    pub fn get(&self) -> f64 {
        self.value
    }

    /// Take a new value if a sample is due. `sample` is only evaluated then.
    ///
    /// Returns `true` if the value was updated.
    pub fn update_with(&mut self, current_time: f64, sample: impl FnOnce() -> f64) -> bool {
        if self.clock.should_sample(current_time) {
            self.value = sample();
            self.clock.advance(current_time);
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert!(SampleConfig::new(0.0).is_err());
        assert!(SampleConfig::from_frequency(-1.0).is_err());
        let config = SampleConfig::from_frequency(10.0).unwrap();
        assert!((config.dt - 0.1).abs() < 1e-12);
        assert!((config.frequency() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn clock_tolerates_accumulated_error() {
        let mut clock = SampleClock::new(SampleConfig::new(0.1).unwrap(), 0.0);
        let mut samples = 0;
        for k in 1..=30 {
            let t = k as f64 * 0.1;
            if clock.should_sample(t) {
                samples += 1;
                clock.advance(t);
            }
        }
        assert_eq!(samples, 30);
    }

    #[test]
    fn long_step_skips_missed_samples() {
        let mut clock = SampleClock::new(SampleConfig::new(0.1).unwrap(), 0.0);
        assert!(clock.should_sample(0.35));
        clock.advance(0.35);
        assert!((clock.next_sample_time - 0.4).abs() < 1e-12);
        assert!((clock.time_until_sample(0.35) - 0.05).abs() < 1e-12);
    }

    #[test]
    fn hold_between_samples() {
        let mut zoh = ZeroOrderHold::new(SampleConfig::new(0.1).unwrap(), 0.0, 0.5);
        assert!(!zoh.update_with(0.05, || 1.0));
        assert_eq!(zoh.get(), 0.5);
        assert!(zoh.update_with(0.1, || 1.0));
        assert_eq!(zoh.get(), 1.0);
        assert!(!zoh.update_with(0.15, || 2.0));
        assert_eq!(zoh.get(), 1.0);
    }
}
