//! Row flagging by score threshold.

use crate::cell::is_decimal_text;
use crate::spec::{SpecHighlightRule, TypeRecord};

/// True when the rule field holds a decimal number strictly below the
/// threshold. Non-numeric, empty and missing fields are never flagged.
pub fn should_highlight(record: &TypeRecord, rule: &SpecHighlightRule) -> bool {
    let Some(value) = record.get(rule.idx_field) else {
        return false;
    };
    let value = value.trim();
    if !is_decimal_text(value) {
        return false;
    }
    value
        .parse::<f64>()
        .map(|n| n < rule.thr_below)
        .unwrap_or(false)
}
