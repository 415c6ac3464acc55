//! Before/after allocation table for human review.

use rustc_hash::FxHashMap;

use crate::aggregate::HoldingsSummary;

/// One group's row in the allocation report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub group: String,
    pub buy: f64,
    pub delta_pct: f64,
    pub before_abs: f64,
    pub before_pct: f64,
    pub after_abs: f64,
    pub after_pct: f64,
    pub target_pct: f64,
}

/// Per-group before/after table, sorted by descending target weight.
#[derive(Debug, Clone)]
pub struct PlanReport {
    pub rows: Vec<ReportRow>,
}

fn pct(part: f64, whole: f64) -> f64 {
    if whole > 0.0 { part / whole * 100.0 } else { 0.0 }
}

impl PlanReport {
    /// Build the report. Never mutates its inputs.
    pub fn new(
        summary: &HoldingsSummary,
        group_buys: &FxHashMap<String, f64>,
        targets: &FxHashMap<String, f64>,
    ) -> Self {
        let total_buys: f64 = group_buys.values().sum();
        let after_total = summary.grand_total + total_buys;

        let mut ordered: Vec<(&String, f64)> =
            targets.iter().map(|(g, &w)| (g, w)).collect();
        ordered.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(y.0)));

        let rows = ordered
            .into_iter()
            .map(|(group, target)| {
                let buy = group_buys.get(group).copied().unwrap_or(0.0);
                let before_abs = summary.group_totals.get(group).copied().unwrap_or(0.0);
                let before_pct = pct(before_abs, summary.grand_total);
                let after_abs = before_abs + buy;
                let after_pct = pct(after_abs, after_total);
                ReportRow {
                    group: group.clone(),
                    buy,
                    delta_pct: after_pct - before_pct,
                    before_abs,
                    before_pct,
                    after_abs,
                    after_pct,
                    target_pct: target * 100.0,
                }
            })
            .collect();

        Self { rows }
    }
}

impl std::fmt::Display for PlanReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "{:<12} {:>8} {:>6} {:>9} {:>5} {:>9} {:>5} {:>5}",
            "group", "change$", "%", "before$", "%", "after$", "%", "tgt%"
        )?;
        for row in &self.rows {
            writeln!(
                f,
                "{:<12} {:>+8.2} {:>+6.2} {:>9.2} {:>5.2} {:>9.2} {:>5.2} {:>5.2}",
                row.group,
                row.buy,
                row.delta_pct,
                row.before_abs,
                row.before_pct,
                row.after_abs,
                row.after_pct,
                row.target_pct,
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn summary() -> HoldingsSummary {
        HoldingsSummary {
            group_totals: map(&[("large_cap", 600.0), ("bonds", 400.0)]),
            grand_total: 1000.0,
            free_cash: 100.0,
        }
    }

    #[test]
    fn rows_sorted_by_descending_target() {
        let report = PlanReport::new(
            &summary(),
            &map(&[("bonds", 100.0)]),
            &map(&[("large_cap", 0.6), ("bonds", 0.4)]),
        );
        assert_eq!(report.rows[0].group, "large_cap");
        assert_eq!(report.rows[1].group, "bonds");
    }

    #[test]
    fn equal_targets_sorted_by_name() {
        let report = PlanReport::new(
            &summary(),
            &map(&[]),
            &map(&[("large_cap", 0.5), ("bonds", 0.5)]),
        );
        assert_eq!(report.rows[0].group, "bonds");
        assert_eq!(report.rows[1].group, "large_cap");
    }

    #[test]
    fn before_after_math() {
        let report = PlanReport::new(
            &summary(),
            &map(&[("bonds", 100.0)]),
            &map(&[("large_cap", 0.6), ("bonds", 0.4)]),
        );
        let bonds = &report.rows[1];
        assert_eq!(bonds.before_abs, 400.0);
        assert_eq!(bonds.before_pct, 40.0);
        assert_eq!(bonds.after_abs, 500.0);
        // 500 of 1100 after the buy
        assert!((bonds.after_pct - 45.4545).abs() < 0.001);
        assert!((bonds.delta_pct - 5.4545).abs() < 0.001);
        assert_eq!(bonds.target_pct, 40.0);
    }

    #[test]
    fn group_without_holdings_shows_zero_before() {
        let report = PlanReport::new(
            &HoldingsSummary {
                group_totals: map(&[("bonds", 400.0)]),
                grand_total: 400.0,
                free_cash: 50.0,
            },
            &map(&[("intl", 50.0)]),
            &map(&[("bonds", 0.8), ("intl", 0.2)]),
        );
        let intl = report.rows.iter().find(|r| r.group == "intl").unwrap();
        assert_eq!(intl.before_abs, 0.0);
        assert_eq!(intl.before_pct, 0.0);
        assert_eq!(intl.after_abs, 50.0);
    }

    #[test]
    fn zero_grand_total_does_not_divide_by_zero() {
        let report = PlanReport::new(
            &HoldingsSummary {
                group_totals: map(&[]),
                grand_total: 0.0,
                free_cash: 100.0,
            },
            &map(&[("bonds", 100.0)]),
            &map(&[("bonds", 1.0)]),
        );
        assert_eq!(report.rows[0].before_pct, 0.0);
        assert_eq!(report.rows[0].after_pct, 100.0);
    }

    #[test]
    fn display_contains_header_and_rows() {
        let report = PlanReport::new(
            &summary(),
            &map(&[("bonds", 100.0)]),
            &map(&[("large_cap", 0.6), ("bonds", 0.4)]),
        );
        let text = format!("{report}");
        assert!(text.contains("tgt%"));
        assert!(text.contains("large_cap"));
        assert!(text.contains("+100.00"));
    }
}
