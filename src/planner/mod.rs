pub mod assemble;
pub mod constants;
pub mod enumerate;
pub mod filter;
pub mod macros;
pub mod scoring;

pub use assemble::assemble;
pub use constants::*;
pub use enumerate::{
    default_workers, AdaptiveEnumerator, BruteForceEnumerator, Enumeration, EnumerationError,
    PlateEnumerator, SearchLimits,
};
#[cfg(feature = "ilp")]
pub use enumerate::IlpEnumerator;
pub use filter::{filter_candidates, CandidateFilters};
pub use macros::{parse_macro, parse_macro_str};
pub use scoring::{score, within_tolerance};
