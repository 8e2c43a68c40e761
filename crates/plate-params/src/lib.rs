pub mod params;
pub mod presets;
pub mod validation;

pub use params::*;
pub use presets::{Preset, PresetId};
pub use validation::*;
