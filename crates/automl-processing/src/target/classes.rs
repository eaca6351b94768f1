//! Class bookkeeping for classification targets.

/// Codes, labels and kept rows after the rare-class filter.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FilteredClasses {
    pub codes: Vec<usize>,
    pub classes: Vec<String>,
    pub kept_rows: Vec<usize>,
    pub removed: Vec<String>,
}

pub(crate) fn class_counts(codes: &[usize], n_classes: usize) -> Vec<usize> {
    let mut counts = vec![0usize; n_classes];
    for &code in codes {
        if let Some(count) = counts.get_mut(code) {
            *count += 1;
        }
    }
    counts
}

/// Remove rows whose class has fewer than `min_count` members.
///
/// Returns `None` when every class is frequent enough. Surviving classes
/// keep their relative order and are re-coded densely.
pub(crate) fn filter_rare_classes(
    codes: &[usize],
    classes: &[String],
    min_count: usize,
) -> Option<FilteredClasses> {
    let counts = class_counts(codes, classes.len());
    if counts.iter().all(|&c| c >= min_count) {
        return None;
    }

    let mut remap: Vec<Option<usize>> = vec![None; classes.len()];
    let mut kept_classes = Vec::new();
    let mut removed = Vec::new();
    for (index, (class, &count)) in classes.iter().zip(&counts).enumerate() {
        if count >= min_count {
            remap[index] = Some(kept_classes.len());
            kept_classes.push(class.clone());
        } else {
            removed.push(class.clone());
        }
    }

    let mut kept_rows = Vec::with_capacity(codes.len());
    let mut new_codes = Vec::with_capacity(codes.len());
    for (row, &code) in codes.iter().enumerate() {
        if let Some(new_code) = remap[code] {
            kept_rows.push(row);
            new_codes.push(new_code);
        }
    }

    Some(FilteredClasses {
        codes: new_codes,
        classes: kept_classes,
        kept_rows,
        removed,
    })
}

/// Majority/minority ratio and the minority class of a binary target.
///
/// Anything but exactly two classes, or two equally frequent classes, is
/// balanced.
pub(crate) fn imbalance(codes: &[usize], n_classes: usize) -> (f64, Option<usize>) {
    if n_classes != 2 {
        return (1.0, None);
    }
    let counts = class_counts(codes, 2);
    let (minority, majority) = match counts[0].cmp(&counts[1]) {
        std::cmp::Ordering::Less => (0, 1),
        std::cmp::Ordering::Greater => (1, 0),
        std::cmp::Ordering::Equal => return (1.0, None),
    };
    if counts[minority] == 0 {
        return (1.0, None);
    }
    (
        counts[majority] as f64 / counts[minority] as f64,
        Some(minority),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_removes_singletons_and_recodes() {
        let classes = labels(&["a", "b", "c"]);
        let codes = vec![0, 1, 0, 2, 2, 0];
        let filtered = filter_rare_classes(&codes, &classes, 2).unwrap();

        assert_eq!(filtered.classes, labels(&["a", "c"]));
        assert_eq!(filtered.removed, labels(&["b"]));
        assert_eq!(filtered.kept_rows, vec![0, 2, 3, 4, 5]);
        assert_eq!(filtered.codes, vec![0, 0, 1, 1, 0]);
    }

    #[test]
    fn test_filter_is_noop_when_all_frequent() {
        let classes = labels(&["a", "b"]);
        assert!(filter_rare_classes(&[0, 1, 1, 0], &classes, 2).is_none());
    }

    #[test]
    fn test_imbalance_ratio() {
        assert_eq!(imbalance(&[0, 0, 0, 1], 2), (3.0, Some(1)));
        assert_eq!(imbalance(&[1, 0, 1, 1, 1, 1], 2), (5.0, Some(0)));
        assert_eq!(imbalance(&[0, 1], 2), (1.0, None));
        assert_eq!(imbalance(&[0, 1, 2, 2], 3), (1.0, None));
    }
}
