pub mod chart;
pub mod error;
pub mod traits;
pub mod types;

pub use chart::*;
pub use error::*;
pub use traits::*;
pub use types::*;
