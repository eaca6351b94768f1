//! Column pruning rules.

use crate::types::{ColumnKind, DropReason};

/// Decide whether a feature column should be dropped.
///
/// `cardinality` counts distinct non-missing values and `rows` is the row
/// count after target filtering. Rules are checked in order, so a constant
/// single-row column reports `Constant` rather than `Identifier`.
pub(crate) fn drop_reason(
    kind: ColumnKind,
    cardinality: usize,
    rows: usize,
    ceiling: Option<usize>,
) -> Option<DropReason> {
    if cardinality <= 1 {
        return Some(DropReason::Constant);
    }

    if kind == ColumnKind::Categorical {
        if cardinality == rows {
            return Some(DropReason::Identifier);
        }
        if let Some(ceiling) = ceiling
            && cardinality > ceiling
        {
            return Some(DropReason::HighCardinality);
        }
    }

    None
}
