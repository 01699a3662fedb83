mod mask;
mod terrain;

pub use mask::{HorizonMask, InMemoryMaskStore, MaskError, MaskStore};
pub use terrain::{GridTerrain, MaskBuilder, SyntheticTerrain, TerrainModel};
