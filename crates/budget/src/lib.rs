//! Budget lifecycle management: daily spend reset, pause/reactivate
//! under budget pressure, and end-of-campaign completion.

pub mod lifecycle;

pub use lifecycle::{BudgetLifecycle, BudgetPassSummary};
