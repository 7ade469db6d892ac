//! Hash-linked journal of committed mutations.
//!
//! Each entry's hash covers its body and the previous entry's hash, so
//! editing, dropping or reordering any committed entry breaks the chain.

use crate::model::{JournalAppend, JournalRecord};
use crate::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical BLAKE3 hash of a journal entry body.
pub fn compute_journal_hash(
    entry: &JournalAppend,
    previous_hash: Option<&str>,
    sequence: u64,
    recorded_at: DateTime<Utc>,
) -> StorageResult<String> {
    let serializable = serde_json::json!({
        "previous_hash": previous_hash,
        "sequence": sequence,
        "height": entry.height,
        "recorded_at": recorded_at,
        "actor": entry.actor,
        "action": entry.action,
    });
    let serialized = serde_json::to_vec(&serializable)
        .map_err(|e| StorageError::Serialization(e.to_string()))?;
    Ok(blake3::hash(&serialized).to_hex().to_string())
}

/// Outcome of walking a journal chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainVerification {
    pub valid: bool,
    pub total_entries: usize,
    pub verified_entries: usize,
    pub first_invalid_index: Option<usize>,
    pub error_message: Option<String>,
}

impl ChainVerification {
    fn broken(total: usize, index: usize, message: String) -> Self {
        Self {
            valid: false,
            total_entries: total,
            verified_entries: index,
            first_invalid_index: Some(index),
            error_message: Some(message),
        }
    }
}

/// Verify a chain of entries given oldest-first.
pub fn verify_chain(entries: &[JournalRecord]) -> StorageResult<ChainVerification> {
    let total = entries.len();
    let mut previous: Option<&str> = None;

    for (i, record) in entries.iter().enumerate() {
        let expected_sequence = i as u64 + 1;
        if record.sequence != expected_sequence {
            return Ok(ChainVerification::broken(
                total,
                i,
                format!(
                    "entry {} has sequence {}, expected {}",
                    record.event_id, record.sequence, expected_sequence
                ),
            ));
        }

        if record.previous_hash.as_deref() != previous {
            return Ok(ChainVerification::broken(
                total,
                i,
                format!(
                    "entry {} has broken chain link (expected prev: {:?}, got: {:?})",
                    record.event_id, previous, record.previous_hash
                ),
            ));
        }

        let body = JournalAppend {
            height: record.height,
            actor: record.actor.clone(),
            action: record.action.clone(),
        };
        let computed =
            compute_journal_hash(&body, previous, record.sequence, record.recorded_at)?;
        if computed != record.hash {
            return Ok(ChainVerification::broken(
                total,
                i,
                format!("entry {} has invalid hash", record.event_id),
            ));
        }

        previous = Some(record.hash.as_str());
    }

    Ok(ChainVerification {
        valid: true,
        total_entries: total,
        verified_entries: total,
        first_invalid_index: None,
        error_message: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::JournalAction;
    use folio_types::{Principal, WorkId};

    fn chain_of(n: u64) -> Vec<JournalRecord> {
        let mut records: Vec<JournalRecord> = Vec::new();
        for i in 1..=n {
            let body = JournalAppend::new(
                100 + i,
                Principal::new("alice"),
                JournalAction::WorkUpdated { work_id: WorkId(i) },
            );
            let previous = records.last().map(|r| r.hash.clone());
            let recorded_at = Utc::now();
            let hash = compute_journal_hash(&body, previous.as_deref(), i, recorded_at).unwrap();
            records.push(JournalRecord {
                event_id: format!("journal-{i}"),
                sequence: i,
                height: body.height,
                recorded_at,
                actor: body.actor,
                action: body.action,
                previous_hash: previous,
                hash,
            });
        }
        records
    }

    #[test]
    fn empty_chain_is_valid() {
        let result = verify_chain(&[]).unwrap();
        assert!(result.valid);
        assert_eq!(result.total_entries, 0);
    }

    #[test]
    fn intact_chain_verifies() {
        let result = verify_chain(&chain_of(4)).unwrap();
        assert!(result.valid);
        assert_eq!(result.verified_entries, 4);
    }

    #[test]
    fn edited_entry_is_detected() {
        let mut chain = chain_of(3);
        chain[1].height += 1;
        let result = verify_chain(&chain).unwrap();
        assert!(!result.valid);
        assert_eq!(result.first_invalid_index, Some(1));
    }

    #[test]
    fn dropped_entry_is_detected() {
        let mut chain = chain_of(3);
        chain.remove(1);
        let result = verify_chain(&chain).unwrap();
        assert!(!result.valid);
        assert_eq!(result.first_invalid_index, Some(1));
    }
}
