//! Inbound Ports (Driving Ports)
//!
//! The API callers use to record and test membership.

use crate::domain::FilterParams;
use crate::error::FilterError;

/// Shared membership filter API (Driving Port)
///
/// All methods take `&self`; implementations are safe to share across
/// threads. `reset` waits for in-flight operations and blocks new ones
/// until it completes.
pub trait MembershipFilter: Send + Sync {
    /// Record `value` as a member.
    fn append(&self, value: &[u8]) -> Result<(), FilterError>;

    /// Whether `value` is possibly a member. False positives are possible,
    /// false negatives are not (absent backend failures).
    fn exists(&self, value: &[u8]) -> Result<bool, FilterError>;

    /// Record `value` and report whether it was possibly a member before
    /// this call.
    fn exists_and_append(&self, value: &[u8]) -> Result<bool, FilterError>;

    /// Discard every member and resize for `expected_items` at `target_fpr`.
    fn reset(&self, expected_items: usize, target_fpr: f64) -> Result<(), FilterError>;

    /// Current sizing.
    fn params(&self) -> FilterParams;
}
