//! Atomic group assembly.
//!
//! The group id is SHA-512/256 over `"TG" ‖ { "txlist": [h_1, .., h_n] }`,
//! where `h_i` is the transaction hash of record `i` with its own group field
//! cleared. The id therefore depends on every member and on their order:
//! changing or reordering any record changes the id stamped into all of them.
//! Compute it once, after every record is final and before any signature.

use rmpv::Value;

use crate::ledger::encoding::{hash_with_prefix, CanonicalMap, GROUP_PREFIX};
use crate::ledger::transaction::Transaction;
use crate::ledger::types::{GroupId, LedgerError, LedgerResult};

/// Maximum number of records in one atomic group.
pub const MAX_GROUP_SIZE: usize = 16;

/// Compute the group id of an ordered set of records.
pub fn compute_group_id(records: &[Transaction]) -> LedgerResult<GroupId> {
    if records.is_empty() {
        return Err(LedgerError::Validation("group is empty".into()));
    }
    if records.len() > MAX_GROUP_SIZE {
        return Err(LedgerError::Validation(format!(
            "group has {} transactions, limit is {}",
            records.len(),
            MAX_GROUP_SIZE
        )));
    }

    let hashes = records
        .iter()
        .map(|tx| Value::Binary(tx.raw_id_ungrouped().to_vec()))
        .collect();
    let encoded = CanonicalMap::new().array("txlist", hashes).encode();
    Ok(GroupId(hash_with_prefix(GROUP_PREFIX, &encoded)))
}

/// Bind `records` into one atomic group, preserving order.
///
/// A single record is returned unchanged.
pub fn assemble_group(records: Vec<Transaction>) -> LedgerResult<Vec<Transaction>> {
    if records.len() == 1 {
        return Ok(records);
    }

    for tx in &records {
        tx.validate()?;
    }

    let group = compute_group_id(&records)?;
    tracing::debug!(size = records.len(), group = %group, "Assembled transaction group");

    Ok(records
        .into_iter()
        .map(|tx| tx.with_group(Some(group)))
        .collect())
}

/// Recompute the group id and check every member carries it.
pub fn verify_group(records: &[Transaction]) -> LedgerResult<GroupId> {
    let expected = compute_group_id(records)?;
    for (i, tx) in records.iter().enumerate() {
        match tx.group() {
            Some(group) if group == expected => {}
            Some(group) => {
                return Err(LedgerError::GroupMismatch(format!(
                    "member {} carries group {} but the set hashes to {}",
                    i, group, expected
                )))
            }
            None => {
                return Err(LedgerError::GroupMismatch(format!(
                    "member {} has no group id",
                    i
                )))
            }
        }
    }
    Ok(expected)
}
