//! Per-user like/collection membership on posts and the counts derived
//! from it.

pub mod counter;
pub mod ledger;

pub use counter::{EngagementCounter, PostTotals};
pub use ledger::{EngagementLedger, EngagementStatus, Toggled};
