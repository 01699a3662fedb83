use serde::{Deserialize, Serialize};

/// Ground observer position on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        }
    }
}

impl Observer {
    pub fn new(latitude_deg: f64, longitude_deg: f64, altitude_m: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equatorial_observer_sits_on_the_semi_major_axis() {
        let obs = Observer::new(0.0, 0.0, 0.0);
        let pos = obs.position_ecef_km();
        assert!((pos[0] - 6378.137).abs() < 1e-6);
        assert!(pos[1].abs() < 1e-9);
        assert!(pos[2].abs() < 1e-9);
    }

    #[test]
    fn polar_observer_is_on_the_z_axis() {
        let obs = Observer::new(90.0, 0.0, 0.0);
        let pos = obs.position_ecef_km();
        assert!(pos[0].abs() < 1e-6);
        // WGS-84 polar radius
        assert!((pos[2] - 6356.752).abs() < 0.01);
    }

    #[test]
    fn altitude_extends_the_radial_distance() {
        let sea = Observer::new(45.0, 7.0, 0.0).position_ecef_km();
        let high = Observer::new(45.0, 7.0, 2000.0).position_ecef_km();
        let r_sea = (sea[0] * sea[0] + sea[1] * sea[1] + sea[2] * sea[2]).sqrt();
        let r_high = (high[0] * high[0] + high[1] * high[1] + high[2] * high[2]).sqrt();
        assert!((r_high - r_sea - 2.0).abs() < 1e-6);
    }
}
