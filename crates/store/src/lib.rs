//! In-memory store backends for the ad engine, backed by DashMap.
//!
//! Production: replace with PostgreSQL (sqlx) or similar ACID store.
//! The API surface is the contract the scheduled passes are written
//! against; every mutation is scoped by an equality precondition so a
//! losing writer updates nothing instead of corrupting state.

pub mod campaigns;
pub mod events;
pub mod seed;
pub mod wallet;

pub use campaigns::CampaignStore;
pub use events::EventStore;
pub use wallet::WalletLedger;
