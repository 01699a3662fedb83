//! Synthetic propagators with closed-form geometry, used by unit tests to
//! exercise search logic without real orbital mechanics.

use chrono::{DateTime, Duration, Utc};

use crate::predict::{Observer, PropagationError, Propagator, TopocentricSample};

/// Elevation follows `peak * sin(2*pi * t / period)` from `epoch`: above the
/// geometric horizon for the first half of every cycle, below for the second.
/// Azimuth is constant, range shrinks linearly with elevation.
pub struct SineOrbit {
    epoch: DateTime<Utc>,
    period_s: f64,
    peak_elevation_deg: f64,
    azimuth_deg: f64,
}

impl SineOrbit {
    pub fn new(
        epoch: DateTime<Utc>,
        period_s: f64,
        peak_elevation_deg: f64,
        azimuth_deg: f64,
    ) -> Self {
        Self {
            epoch,
            period_s,
            peak_elevation_deg,
            azimuth_deg,
        }
    }
}

impl Propagator for SineOrbit {
    fn topocentric(
        &self,
        _observer: &Observer,
        timestamp: DateTime<Utc>,
    ) -> Result<TopocentricSample, PropagationError> {
        let dt = (timestamp - self.epoch).num_milliseconds() as f64 / 1000.0;
        let phase = 2.0 * std::f64::consts::PI * dt / self.period_s;
        let elevation_deg = self.peak_elevation_deg * phase.sin();
        Ok(TopocentricSample {
            timestamp,
            azimuth_deg: self.azimuth_deg,
            elevation_deg,
            range_km: 2000.0 - 15.0 * elevation_deg,
        })
    }
}

/// Wraps a propagator and fails every sample inside one time interval.
pub struct Faulty<P> {
    inner: P,
    fail_from: DateTime<Utc>,
    fail_until: DateTime<Utc>,
}

impl<P> Faulty<P> {
    pub fn new(inner: P, fail_from: DateTime<Utc>, outage: Duration) -> Self {
        Self {
            inner,
            fail_from,
            fail_until: fail_from + outage,
        }
    }
}

impl<P: Propagator> Propagator for Faulty<P> {
    fn topocentric(
        &self,
        observer: &Observer,
        timestamp: DateTime<Utc>,
    ) -> Result<TopocentricSample, PropagationError> {
        if timestamp >= self.fail_from && timestamp < self.fail_until {
            return Err(PropagationError::Propagation("simulated outage".into()));
        }
        self.inner.topocentric(observer, timestamp)
    }
}

/// Diverges on every sample, like decayed elements.
pub struct DeadOrbit;

impl Propagator for DeadOrbit {
    fn topocentric(
        &self,
        _observer: &Observer,
        _timestamp: DateTime<Utc>,
    ) -> Result<TopocentricSample, PropagationError> {
        Err(PropagationError::Propagation("elements decayed".into()))
    }
}
