use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaskError {
    #[error("horizon mask not found: {0}")]
    NotFound(String),
    #[error("invalid horizon profile: {0}")]
    InvalidProfile(String),
}

/// Minimum visible elevation per integer azimuth degree, 0..=359.
///
/// Lookups round the azimuth to the nearest bucket and wrap modulo 360.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HorizonMask {
    elevations_deg: Vec<f64>,
}

impl Default for HorizonMask {
    /// Flat geometric horizon at 0 degrees.
    fn default() -> Self {
        Self {
            elevations_deg: vec![0.0; 360],
        }
    }
}

impl HorizonMask {
    pub fn new(elevations_deg: Vec<f64>) -> Result<Self, MaskError> {
        if elevations_deg.len() != 360 {
            return Err(MaskError::InvalidProfile(format!(
                "expected 360 azimuth buckets, got {}",
                elevations_deg.len()
            )));
        }
        if let Some(v) = elevations_deg.iter().find(|v| !v.is_finite() || **v < 0.0) {
            return Err(MaskError::InvalidProfile(format!(
                "elevation {} below horizon or not finite",
                v
            )));
        }
        Ok(Self { elevations_deg })
    }

    pub fn elevation_at(&self, azimuth_deg: f64) -> f64 {
        let idx = (azimuth_deg.round() as i64).rem_euclid(360) as usize;
        self.elevations_deg[idx]
    }

    pub fn elevations(&self) -> &[f64] {
        &self.elevations_deg
    }
}

/// Lookup of stored horizon profiles by opaque id.
pub trait MaskStore: Send + Sync {
    fn lookup(&self, id: &str) -> Result<HorizonMask, MaskError>;
}

#[derive(Debug, Default)]
pub struct InMemoryMaskStore {
    masks: HashMap<String, HorizonMask>,
}

impl InMemoryMaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, mask: HorizonMask) {
        self.masks.insert(id.into(), mask);
    }
}

impl MaskStore for InMemoryMaskStore {
    fn lookup(&self, id: &str) -> Result<HorizonMask, MaskError> {
        self.masks
            .get(id)
            .cloned()
            .ok_or_else(|| MaskError::NotFound(id.to_string()))
    }
}
