//! Distance reader.

mod reader;

pub use reader::{DistanceReader, create_component};
