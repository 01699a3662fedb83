use super::mask::{HorizonMask, MaskError};

const KM_PER_DEG_LAT: f64 = 111.0;

/// Terrain elevation lookup used to derive static horizon masks.
pub trait TerrainModel {
    fn elevation_m(&self, lat_deg: f64, lon_deg: f64) -> f64;
}

/// Deterministic pseudo-terrain, useful as a stand-in until a real DEM
/// reader is plugged in.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticTerrain {
    pub base_m: f64,
    pub lat_amplitude_m: f64,
    pub lon_amplitude_m: f64,
}

impl Default for SyntheticTerrain {
    fn default() -> Self {
        Self {
            base_m: 100.0,
            lat_amplitude_m: 20.0,
            lon_amplitude_m: 10.0,
        }
    }
}

impl TerrainModel for SyntheticTerrain {
    fn elevation_m(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        self.base_m
            + self.lat_amplitude_m * lat_deg.to_radians().sin()
            + self.lon_amplitude_m * lon_deg.to_radians().cos()
    }
}

/// In-memory rectangular elevation grid with nearest-cell lookup.
#[derive(Debug, Clone)]
pub struct GridTerrain {
    origin_lat_deg: f64,
    origin_lon_deg: f64,
    cell_deg: f64,
    rows: usize,
    cols: usize,
    cells_m: Vec<f64>,
}

impl GridTerrain {
    pub fn new(
        origin_lat_deg: f64,
        origin_lon_deg: f64,
        cell_deg: f64,
        rows: usize,
        cols: usize,
        cells_m: Vec<f64>,
    ) -> Result<Self, MaskError> {
        if cells_m.len() != rows * cols {
            return Err(MaskError::InvalidProfile(format!(
                "terrain grid needs {} cells, got {}",
                rows * cols,
                cells_m.len()
            )));
        }
        Ok(Self {
            origin_lat_deg,
            origin_lon_deg,
            cell_deg,
            rows,
            cols,
            cells_m,
        })
    }
}

impl TerrainModel for GridTerrain {
    fn elevation_m(&self, lat_deg: f64, lon_deg: f64) -> f64 {
        let row = ((lat_deg - self.origin_lat_deg) / self.cell_deg).round();
        let col = ((lon_deg - self.origin_lon_deg) / self.cell_deg).round();
        if row < 0.0 || col < 0.0 {
            return 0.0;
        }
        let (row, col) = (row as usize, col as usize);
        if row >= self.rows || col >= self.cols {
            return 0.0;
        }
        self.cells_m[row * self.cols + col]
    }
}

/// Builds a 360-bucket horizon mask by radial terrain scanning.
///
/// For each bearing the terrain is sampled out to `search_radius_km` at
/// `sample_step_km`, keeping the maximum apparent elevation angle above the
/// observer's tangent plane. The flat-plane geometry ignores Earth curvature
/// over the search radius, which is acceptable for radii far below the Earth
/// radius; masks derived this way are slightly pessimistic for distant ridges.
#[derive(Debug, Clone, Copy)]
pub struct MaskBuilder {
    pub search_radius_km: f64,
    pub sample_step_km: f64,
}

impl Default for MaskBuilder {
    fn default() -> Self {
        Self {
            search_radius_km: 50.0,
            sample_step_km: 0.5,
        }
    }
}

impl MaskBuilder {
    pub fn build<T: TerrainModel>(
        &self,
        terrain: &T,
        observer_lat_deg: f64,
        observer_lon_deg: f64,
    ) -> Result<HorizonMask, MaskError> {
        if self.sample_step_km <= 0.0 || self.search_radius_km <= 0.0 {
            return Err(MaskError::InvalidProfile(
                "search radius and sample step must be positive".into(),
            ));
        }

        let site_m = terrain.elevation_m(observer_lat_deg, observer_lon_deg);
        let steps = (self.search_radius_km / self.sample_step_km).max(1.0) as usize;
        let cos_lat = observer_lat_deg.to_radians().cos();

        let mut elevations = vec![0.0; 360];
        for (az, bucket) in elevations.iter_mut().enumerate() {
            let az_rad = (az as f64).to_radians();
            let mut max_el: f64 = 0.0;
            for s in 1..=steps {
                let r_km = s as f64 * self.sample_step_km;
                // Equirectangular step, fine for small radii
                let lat = observer_lat_deg + (r_km / KM_PER_DEG_LAT) * az_rad.cos();
                let lon = observer_lon_deg + (r_km / (KM_PER_DEG_LAT * cos_lat)) * az_rad.sin();
                let dh = terrain.elevation_m(lat, lon) - site_m;
                let el = dh.atan2(r_km * 1000.0).to_degrees();
                max_el = max_el.max(el);
            }
            *bucket = max_el;
        }

        log::debug!(
            "built horizon mask at ({:.4}, {:.4}), peak {:.2} deg",
            observer_lat_deg,
            observer_lon_deg,
            elevations.iter().cloned().fold(0.0, f64::max)
        );
        HorizonMask::new(elevations)
    }
}
