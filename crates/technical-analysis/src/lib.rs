pub mod indicators;
pub mod levels;
pub mod screen;


pub use indicators::*;
pub use levels::*;
pub use screen::*;
