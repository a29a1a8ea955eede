//! Service layer: the coordinate core and the proposal normalizer.
//!
//! Everything here is independent of transport. The HTTP handlers and the
//! persistence services call into these modules and only translate inputs
//! and outputs.

pub mod clock;
pub mod coordinates;
pub mod normalizer;
pub mod resolver;
pub mod validation;

pub use clock::{Clock, FixedClock, SystemClock};
pub use coordinates::{
    convert_equatorial_to_galactic, convert_equatorial_to_horizontal,
    convert_galactic_to_equatorial, convert_sexagesimal_to_decimal_degrees,
    equatorial_to_galactic, format_equatorial, format_sexagesimal,
    round_to_milliarcsecond_precision,
};
pub use normalizer::ProposalNormalizer;
pub use resolver::{CoordinateResolver, ResolvedPosition};
pub use validation::{validate_proposal, ValidationReport};
