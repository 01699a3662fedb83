mod error;
mod finder;
mod window;

pub use error::PassError;
pub use finder::{PassFinder, SearchConfig};
pub use window::PassWindow;
