//! Auction-side scoring: targeting completeness and the campaign
//! quality score used as a bid multiplier
//! (`AuctionScore = Bid × QualityScore × CTRFactor`; the ranking
//! itself lives with ad delivery, not here).

pub mod quality;
pub mod targeting;

pub use quality::{compute_quality_score, QualityRecalcPass, QualityRecalcSummary};
pub use targeting::completeness_score;
