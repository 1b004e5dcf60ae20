pub mod bounds;
pub mod config;
pub mod reducer;
pub mod synth;
pub mod types;

pub use bounds::{InputBounds, MeasurementRange, ValidationError};
pub use config::MatsizeConfig;
pub use reducer::reduce;
pub use synth::{synthesize, synthesize_fallback};
pub use types::*;
