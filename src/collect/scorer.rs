use crate::passes::PassWindow;

/// Assigns the objective value of a candidate pass. Injected per request so
/// callers can bring externally computed quality metrics (link margin,
/// bitrate, priority weighting) without the core knowing their internals.
pub trait Scorer: Send + Sync {
    fn value(&self, satellite_id: &str, window: &PassWindow) -> f64;
}

/// Default scorer: pass duration in seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct DurationScorer;

impl Scorer for DurationScorer {
    fn value(&self, _satellite_id: &str, window: &PassWindow) -> f64 {
        window.duration_s
    }
}

/// Deliverable data volume: duration times bitrate, optionally weighted.
#[derive(Debug, Clone, Copy)]
pub struct DataVolumeScorer {
    pub bitrate_bps: f64,
    pub weight: f64,
}

impl Scorer for DataVolumeScorer {
    fn value(&self, _satellite_id: &str, window: &PassWindow) -> f64 {
        window.duration_s * self.bitrate_bps * self.weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn window(duration_s: f64) -> PassWindow {
        let rise = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let set = rise + Duration::milliseconds((duration_s * 1000.0) as i64);
        PassWindow {
            rise,
            culmination: rise + (set - rise) / 2,
            set,
            max_elevation_deg: 40.0,
            rise_azimuth_deg: 10.0,
            set_azimuth_deg: 200.0,
            duration_s,
        }
    }

    #[test]
    fn duration_scorer_returns_seconds() {
        assert_eq!(DurationScorer.value("sat", &window(600.0)), 600.0);
    }

    #[test]
    fn data_volume_scorer_multiplies_out() {
        let scorer = DataVolumeScorer {
            bitrate_bps: 120_000.0,
            weight: 0.5,
        };
        assert_eq!(scorer.value("sat", &window(100.0)), 6_000_000.0);
    }
}
