pub mod coord;
pub mod error;
pub mod value;

pub use coord::*;
pub use error::*;
pub use value::*;
