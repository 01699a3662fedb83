use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One visibility window: the satellite is above the active elevation
/// threshold between `rise` and `set`, peaking at `culmination`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PassWindow {
    pub rise: DateTime<Utc>,
    pub culmination: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub max_elevation_deg: f64,
    pub rise_azimuth_deg: f64,
    pub set_azimuth_deg: f64,
    pub duration_s: f64,
}

impl PassWindow {
    pub fn duration(&self) -> chrono::Duration {
        self.set - self.rise
    }
}
