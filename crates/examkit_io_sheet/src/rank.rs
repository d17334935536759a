//! Stable multi-key ordering of records.

use std::cmp::Ordering;

use crate::spec::{EnumSortDirection, SpecSortKey, TypeRecord};

/// Return a stably sorted copy of `records` under the composite key.
///
/// Records too short to carry every keyed field are unordered relative to
/// the rest: each keeps its input position and splits the sequence into
/// runs, and only the runs of complete records between them are sorted.
/// Ties keep their input order, so ranking a ranked sequence is a no-op.
pub fn rank_records(records: &[TypeRecord], sort_keys: &[SpecSortKey]) -> Vec<TypeRecord> {
    let n_len_complete = sort_keys
        .iter()
        .map(|key| key.idx_field + 1)
        .max()
        .unwrap_or(0);

    let mut l_ranked = records.to_vec();
    for l_run in l_ranked.split_mut(|record| record.len() < n_len_complete) {
        l_run.sort_by(|lhs, rhs| compare_records(lhs, rhs, sort_keys));
    }
    l_ranked
}

/// Compare two records key by key.
///
/// When either record is too short to carry a keyed field the pair is
/// treated as equal for the whole comparison.
pub fn compare_records(lhs: &TypeRecord, rhs: &TypeRecord, sort_keys: &[SpecSortKey]) -> Ordering {
    for key in sort_keys {
        if lhs.len() <= key.idx_field || rhs.len() <= key.idx_field {
            return Ordering::Equal;
        }
        let ord = compare_optional_text(
            Some(lhs[key.idx_field].as_str()),
            Some(rhs[key.idx_field].as_str()),
            key.if_case_sensitive,
        );
        let ord = match key.rule_direction {
            EnumSortDirection::Ascending => ord,
            EnumSortDirection::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Null-safe text comparison; a missing value sorts before any text.
///
/// Record fields are never missing, so [`compare_records`] always passes
/// `Some`; `None` serves callers comparing optional values.
pub fn compare_optional_text(lhs: Option<&str>, rhs: Option<&str>, if_case_sensitive: bool) -> Ordering {
    match (lhs, rhs) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) if if_case_sensitive => a.cmp(b),
        (Some(a), Some(b)) => a
            .chars()
            .flat_map(char::to_lowercase)
            .cmp(b.chars().flat_map(char::to_lowercase)),
    }
}
