use chrono::{DateTime, Utc};
use serde::Serialize;
use sgp4::{Constants, Elements};

use super::error::PropagationError;
use super::observer::Observer;

/// Look angles from an observer to a satellite at one instant.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct TopocentricSample {
    pub timestamp: DateTime<Utc>,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

/// Orbital state source. Implementations must be pure: identical inputs
/// always yield identical samples (or the same error), so callers may share
/// one instance across threads without synchronization.
pub trait Propagator: Send + Sync {
    fn topocentric(
        &self,
        observer: &Observer,
        timestamp: DateTime<Utc>,
    ) -> Result<TopocentricSample, PropagationError>;
}

/// SGP4-backed satellite, parsed once from TLE lines and immutable afterwards.
#[derive(Debug)]
pub struct Satellite {
    pub id: String,
    pub name: Option<String>,
    elements: Elements,
    constants: Constants,
}

impl Satellite {
    /// Parse a 2- or 3-line TLE block (optional name line first).
    pub fn from_tle(id: impl Into<String>, tle: &str) -> Result<Self, PropagationError> {
        let (name, line1, line2) = split_tle_lines(tle)?;
        let elements = Elements::from_tle(name.clone(), line1.as_bytes(), line2.as_bytes())
            .map_err(|e| PropagationError::InvalidTle(e.to_string()))?;
        let constants = Constants::from_elements(&elements)
            .map_err(|e| PropagationError::InvalidTle(e.to_string()))?;

        Ok(Self {
            id: id.into(),
            name: elements.object_name.clone(),
            elements,
            constants,
        })
    }

    pub fn norad_id(&self) -> u64 {
        self.elements.norad_id
    }
}

impl Propagator for Satellite {
    fn topocentric(
        &self,
        observer: &Observer,
        timestamp: DateTime<Utc>,
    ) -> Result<TopocentricSample, PropagationError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&timestamp.naive_utc())
            .map_err(|e| PropagationError::Propagation(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PropagationError::Propagation(e.to_string()))?;

        let sidereal = sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(
            &timestamp.naive_utc(),
        ));
        let sat_ecef = teme_to_ecef(prediction.position, sidereal);
        let obs_ecef = observer.position_ecef_km();

        let dr = [
            sat_ecef[0] - obs_ecef[0],
            sat_ecef[1] - obs_ecef[1],
            sat_ecef[2] - obs_ecef[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();

        let (east, north, up) = ecef_to_enu(dr, observer.lat_rad(), observer.lon_rad());
        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            0.0
        };

        Ok(TopocentricSample {
            timestamp,
            azimuth_deg,
            elevation_deg,
            range_km,
        })
    }
}

fn split_tle_lines(tle: &str) -> Result<(Option<String>, String, String), PropagationError> {
    let lines: Vec<&str> = tle
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect();

    match lines.len() {
        2 => Ok((None, lines[0].to_string(), lines[1].to_string())),
        3 => Ok((
            Some(lines[0].to_string()),
            lines[1].to_string(),
            lines[2].to_string(),
        )),
        _ => Err(PropagationError::InvalidTleFormat),
    }
}

fn teme_to_ecef(pos_teme: [f64; 3], gmst: f64) -> [f64; 3] {
    let cos_gmst = gmst.cos();
    let sin_gmst = gmst.sin();
    [
        pos_teme[0] * cos_gmst + pos_teme[1] * sin_gmst,
        -pos_teme[0] * sin_gmst + pos_teme[1] * cos_gmst,
        pos_teme[2],
    ]
}

fn ecef_to_enu(dr: [f64; 3], lat_rad: f64, lon_rad: f64) -> (f64, f64, f64) {
    let sin_lat = lat_rad.sin();
    let cos_lat = lat_rad.cos();
    let sin_lon = lon_rad.sin();
    let cos_lon = lon_rad.cos();

    let east = -sin_lon * dr[0] + cos_lon * dr[1];
    let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
    let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
    (east, north, up)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ISS_TLE: &str = "\
ISS (ZARYA)
1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927
2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 13, 0, 0).unwrap()
    }

    #[test]
    fn parses_three_line_tle() {
        let sat = Satellite::from_tle("25544", ISS_TLE).unwrap();
        assert_eq!(sat.norad_id(), 25544);
        assert_eq!(sat.name.as_deref(), Some("ISS (ZARYA)"));
    }

    #[test]
    fn parses_two_line_tle() {
        let body: String = ISS_TLE.lines().skip(1).collect::<Vec<_>>().join("\n");
        let sat = Satellite::from_tle("25544", &body).unwrap();
        assert_eq!(sat.norad_id(), 25544);
        assert!(sat.name.is_none());
    }

    #[test]
    fn rejects_single_line_input() {
        let err = Satellite::from_tle("x", "just one line").unwrap_err();
        assert_eq!(err, PropagationError::InvalidTleFormat);
    }

    #[test]
    fn topocentric_sample_is_in_range() {
        let sat = Satellite::from_tle("25544", ISS_TLE).unwrap();
        let obs = Observer::new(48.15, 11.57, 520.0);
        let sample = sat.topocentric(&obs, epoch()).unwrap();
        assert!((0.0..360.0).contains(&sample.azimuth_deg));
        assert!((-90.0..=90.0).contains(&sample.elevation_deg));
        // LEO slant range from the ground
        assert!(sample.range_km > 300.0 && sample.range_km < 20_000.0);
    }

    #[test]
    fn topocentric_is_pure() {
        let sat = Satellite::from_tle("25544", ISS_TLE).unwrap();
        let obs = Observer::new(48.15, 11.57, 520.0);
        let a = sat.topocentric(&obs, epoch()).unwrap();
        let b = sat.topocentric(&obs, epoch()).unwrap();
        assert_eq!(a.azimuth_deg, b.azimuth_deg);
        assert_eq!(a.elevation_deg, b.elevation_deg);
        assert_eq!(a.range_km, b.range_km);
    }
}
