use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Occupied/available partition of a lot's slot labels.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OccupancyResult {
    pub occupied: Vec<String>,
    pub available: Vec<String>,
    pub total: usize,
}

/// Slot label order: integer labels first by value, then everything else
/// lexically. Equal numeric values (`"7"`, `"07"`) fall back to the text.
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

pub fn sort_labels(labels: &mut [String]) {
    labels.sort_by(|a, b| compare_labels(a, b));
}

/// Split `all_labels` into occupied and available. Marks for labels outside
/// `all_labels` are ignored and duplicate labels count once.
pub fn assemble<'a, I>(all_labels: I, occupied: &BTreeSet<String>) -> OccupancyResult
where
    I: IntoIterator<Item = &'a str>,
{
    let mut labels: Vec<String> = all_labels.into_iter().map(str::to_string).collect();
    sort_labels(&mut labels);
    labels.dedup();

    let total = labels.len();
    let (occupied, available): (Vec<String>, Vec<String>) = labels
        .into_iter()
        .partition(|label| occupied.contains(label));

    OccupancyResult {
        occupied,
        available,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marked(labels: &[&str]) -> BTreeSet<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_numeric_labels_sort_by_value() {
        let result = assemble(["10", "2", "1"], &marked(&["10"]));
        assert_eq!(result.occupied, vec!["10"]);
        assert_eq!(result.available, vec!["1", "2"]);
        assert_eq!(result.total, 3);
    }

    #[test]
    fn test_non_numeric_labels_follow_numeric_ones() {
        let mut labels = vec![
            "B2".to_string(),
            "3".to_string(),
            "A1".to_string(),
            "-1".to_string(),
            "03".to_string(),
        ];
        sort_labels(&mut labels);
        assert_eq!(labels, vec!["-1", "03", "3", "A1", "B2"]);
    }

    #[test]
    fn test_duplicates_count_once() {
        let result = assemble(["1", "2", "1"], &marked(&["1"]));
        assert_eq!(result.occupied, vec!["1"]);
        assert_eq!(result.available, vec!["2"]);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_unknown_marks_are_ignored() {
        let result = assemble(["1", "2"], &marked(&["9"]));
        assert!(result.occupied.is_empty());
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_empty_label_set() {
        let result = assemble(std::iter::empty(), &marked(&[]));
        assert_eq!(result, OccupancyResult::default());
    }

    #[test]
    fn test_partition_invariant() {
        // Deterministic LCG
        let mut state = 0x2545_f491_u64;
        let mut next = move || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 33) as usize
        };

        for _ in 0..200 {
            let n = next() % 12;
            let labels: Vec<String> = (0..n)
                .map(|_| match next() % 3 {
                    0 => format!("{}", next() % 20),
                    1 => format!("P{}", next() % 5),
                    _ => format!("{:02}", next() % 20),
                })
                .collect();
            let marks: BTreeSet<String> = labels
                .iter()
                .filter(|_| next() % 2 == 0)
                .cloned()
                .chain(std::iter::once("ghost".to_string()))
                .collect();

            let result = assemble(labels.iter().map(String::as_str), &marks);
            let distinct: BTreeSet<&String> = labels.iter().collect();

            let mut union: Vec<&String> =
                result.occupied.iter().chain(&result.available).collect();
            union.sort();
            let expected: Vec<&String> = distinct.iter().copied().collect();

            assert_eq!(union, expected, "union must be the label set");
            assert!(
                result.occupied.iter().all(|l| !result.available.contains(l)),
                "occupied and available must be disjoint"
            );
            assert_eq!(result.total, distinct.len());
            assert!(result.occupied.iter().all(|l| marks.contains(l)));
        }
    }

    #[test]
    fn test_result_serializes_as_plain_object() {
        let result = assemble(["1", "2"], &marked(&["2"]));
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"occupied": ["2"], "available": ["1"], "total": 2})
        );
    }
}
