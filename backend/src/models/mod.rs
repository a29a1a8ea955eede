pub mod coordinates;
pub mod proposal;

pub use coordinates::*;
pub use proposal::*;
