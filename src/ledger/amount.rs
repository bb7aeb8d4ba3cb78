//! Integer amount arithmetic in base units.

use crate::ledger::types::{LedgerError, LedgerResult};

/// Basis points in one whole.
pub const BASIS_POINTS: u64 = 10_000;

/// `amount * basis_points / 10_000`, rounded half up.
///
/// Computed in 128-bit integers; fails only when `basis_points` exceeds
/// 100% by enough to overflow a `u64` result.
pub fn percent_of(amount: u64, basis_points: u64) -> LedgerResult<u64> {
    let scaled = amount as u128 * basis_points as u128;
    let whole = BASIS_POINTS as u128;
    let rounded = (scaled + whole / 2) / whole;
    u64::try_from(rounded).map_err(|_| {
        LedgerError::Validation(format!(
            "{} basis points of {} overflows an amount",
            basis_points, amount
        ))
    })
}
