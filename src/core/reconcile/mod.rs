//! Refset reconciliation
//!
//! Converges the stored members of a refset toward a desired member list with
//! the fewest writes. The control flow in [`engine`] is shared by all refset
//! types; [`refset_type`] holds what differs between them.

pub mod engine;
pub mod lock;
pub mod plan;
pub mod progress;
pub mod refset_type;

pub use engine::{ReconciliationEngine, ReconciliationResult};
pub use plan::ReconciliationPlan;
pub use progress::{NoProgress, ProgressSink};
pub use refset_type::{CorrelationMapRefset, RefsetKind, RefsetType, SimpleRefset};
