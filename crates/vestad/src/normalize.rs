//! Path normalization.
//!
//! Traversal returns rows from two structural shapes: cause chained directly
//! to a repair, and cause refined through a subcause. This module unions
//! them into one flat record type: absent subcauses are coerced to the
//! sentinel, rows without a terminal repair are dropped (never defaulted),
//! duplicates are removed, and the result is stable-sorted by
//! `(cause, sub_cause)` with the sentinel ordering as any other string.

use std::collections::HashSet;
use vesta_common::{CausalPath, PathRow, NO_REPAIR, NO_SUBCAUSE};

/// Pure function from raw traversal rows to normalized causal paths.
pub fn normalize(rows: Vec<PathRow>) -> Vec<CausalPath> {
    let mut seen: HashSet<(String, String, String, String)> = HashSet::new();
    let mut paths: Vec<CausalPath> = Vec::new();

    for row in rows {
        let repair = match row.repair {
            Some(r) if r != NO_REPAIR => r,
            // No repair reachable: the row is discarded, not defaulted.
            _ => continue,
        };
        let sub_cause = match row.sub_cause {
            Some(s) if s != NO_SUBCAUSE => s,
            _ => NO_SUBCAUSE.to_string(),
        };
        let key = (
            row.event.clone(),
            row.cause.clone(),
            sub_cause.clone(),
            repair.clone(),
        );
        if !seen.insert(key) {
            continue;
        }
        paths.push(CausalPath {
            event: row.event,
            cause: row.cause,
            sub_cause,
            repair,
            validation: row.validation,
        });
    }

    paths.sort_by(|a, b| {
        (a.cause.as_str(), a.sub_cause.as_str()).cmp(&(b.cause.as_str(), b.sub_cause.as_str()))
    });
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cause: &str, sub: Option<&str>, repair: Option<&str>) -> PathRow {
        PathRow {
            event: "母线电压异常".into(),
            cause: cause.into(),
            sub_cause: sub.map(String::from),
            repair: repair.map(String::from),
            validation: None,
        }
    }

    #[test]
    fn test_direct_rows_get_subcause_sentinel() {
        let paths = normalize(vec![
            row("母线接地/漏电", None, Some("切换旁路/隔离故障段")),
            row("电压瞬变/尖峰", Some(NO_SUBCAUSE), Some("重标定电压/电流采样通道")),
        ]);
        assert_eq!(paths.len(), 2);
        for p in &paths {
            assert_eq!(p.sub_cause, NO_SUBCAUSE);
            assert!(p.is_direct());
        }
    }

    #[test]
    fn test_rows_without_repair_are_dropped() {
        let paths = normalize(vec![
            row("原因A", Some("子原因1"), None),
            row("原因B", None, Some(NO_REPAIR)),
            row("原因C", Some("子原因2"), Some("修复C")),
        ]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].cause, "原因C");
        assert!(paths.iter().all(|p| p.repair != NO_REPAIR));
    }

    #[test]
    fn test_duplicate_rows_collapse() {
        let paths = normalize(vec![
            row("原因A", Some("子原因1"), Some("修复A")),
            row("原因A", Some("子原因1"), Some("修复A")),
        ]);
        assert_eq!(paths.len(), 1);
    }

    #[test]
    fn test_stable_sort_by_cause_then_subcause() {
        let paths = normalize(vec![
            row("乙原因", Some("丙子原因"), Some("修复2")),
            row("乙原因", None, Some("修复3")),
            row("甲原因", Some("乙子原因"), Some("修复1")),
        ]);
        let keys: Vec<(&str, &str)> = paths
            .iter()
            .map(|p| (p.cause.as_str(), p.sub_cause.as_str()))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn test_empty_input_is_empty_output() {
        assert!(normalize(vec![]).is_empty());
    }
}
