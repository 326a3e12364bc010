pub mod catalog;
pub mod macros;
pub mod schedule;

pub use catalog::*;
pub use schedule::*;
