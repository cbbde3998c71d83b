pub mod intent;
pub mod params;

pub use intent::*;
pub use params::*;
