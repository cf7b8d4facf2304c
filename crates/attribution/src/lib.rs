//! Click-to-conversion attribution: credit a reservation, pack
//! purchase, page view, or contact action to the user's most recent
//! valid ad click inside a fixed 24-hour window.

pub mod attributor;

pub use attributor::{AttributionOutcome, ConversionAttributor, ConversionRequest};
