mod error;
mod observer;
mod propagation;

pub use error::PropagationError;
pub use observer::Observer;
pub use propagation::{Propagator, Satellite, TopocentricSample};
