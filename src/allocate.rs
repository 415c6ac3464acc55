//! Allocation engine: iterative water-filling of free cash across
//! under-target groups.
//!
//! Each round projects every group's share of the portfolio including cash
//! already allocated, funds the groups still below their target weight with
//! equal dollar increments until the least-behind one catches up, and
//! repeats. Once every group has met its target, whatever cash is left is
//! spread evenly across all configured groups. Pure function of its inputs.

use rustc_hash::FxHashMap;

/// A projected share within this distance of its target counts as met.
/// Keeps the at-target boundary deterministic: a group sitting exactly on
/// its target weight never receives targeted allocation.
const AT_TARGET_EPS: f64 = 1e-9;

/// Distribute `free_cash` across groups toward the target weights.
///
/// `group_totals` holds current dollars per group (groups with no holdings
/// may be absent), `grand_total` their sum, `targets` the weight table
/// (validated to sum to 1). Returns dollars to buy per group; the values
/// sum to `free_cash` whenever it is positive, and the map is empty when
/// `free_cash <= 0`.
pub fn allocate(
    group_totals: &FxHashMap<String, f64>,
    grand_total: f64,
    targets: &FxHashMap<String, f64>,
    free_cash: f64,
) -> FxHashMap<String, f64> {
    let mut group_buys: FxHashMap<String, f64> = FxHashMap::default();
    if free_cash <= 0.0 || targets.is_empty() {
        return group_buys;
    }

    let mut total_buys = 0.0_f64;

    while total_buys < free_cash {
        let invested = grand_total + total_buys;
        let remaining = free_cash - total_buys;

        // Empty-portfolio bootstrap: no shares exist to project, so seed
        // every group in proportion to its target weight. The weights are
        // normalized so the seed consumes all remaining cash even when the
        // configured sum sits inside the validation tolerance around 1.
        if invested == 0.0 {
            let target_sum: f64 = targets.values().sum();
            for (group, &target) in targets {
                *group_buys.entry(group.clone()).or_insert(0.0) +=
                    remaining * target / target_sum;
            }
            break;
        }

        let mut under_target: Vec<&String> = Vec::new();
        let mut min_gap = f64::MAX;
        for (group, &target) in targets {
            let held = group_totals.get(group).copied().unwrap_or(0.0);
            let bought = group_buys.get(group).copied().unwrap_or(0.0);
            let cur = (held + bought) / invested;
            if cur >= target - AT_TARGET_EPS {
                continue;
            }
            under_target.push(group);
            min_gap = min_gap.min(target - cur);
        }

        if under_target.is_empty() {
            // Every group has met its target: the rest is unavoidable
            // overshoot, spread evenly over all configured groups.
            let share = remaining / targets.len() as f64;
            for group in targets.keys() {
                *group_buys.entry(group.clone()).or_insert(0.0) += share;
            }
            break;
        }

        // Spend just enough to bring the least-behind group up to target if
        // the increment were spread evenly, with the round's denominator
        // frozen at its starting value. The next round re-projects against
        // the grown portfolio, so convergence is self-correcting.
        let buy_size = remaining.min(min_gap * invested * under_target.len() as f64);
        let share = buy_size / under_target.len() as f64;
        for group in &under_target {
            *group_buys.entry((*group).clone()).or_insert(0.0) += share;
        }
        total_buys += buy_size;
    }

    group_buys
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(pairs: &[(&str, f64)]) -> FxHashMap<String, f64> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    fn sum(buys: &FxHashMap<String, f64>) -> f64 {
        buys.values().sum()
    }

    #[test]
    fn empty_portfolio_bootstraps_proportional_to_targets() {
        let buys = allocate(
            &totals(&[("a", 0.0), ("b", 0.0)]),
            0.0,
            &totals(&[("a", 0.6), ("b", 0.4)]),
            100.0,
        );
        assert!((buys["a"] - 60.0).abs() < 1e-9);
        assert!((buys["b"] - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_portfolio_bootstrap_spends_all_cash_with_off_unit_weights() {
        // Weight sums inside the config tolerance (here 0.995) must not leak
        // cash out of the bootstrap seed.
        let buys = allocate(
            &FxHashMap::default(),
            0.0,
            &totals(&[("a", 0.6), ("b", 0.395)]),
            100.0,
        );
        assert!((sum(&buys) - 100.0).abs() < 1e-6);
        assert!((buys["a"] - 100.0 * 0.6 / 0.995).abs() < 1e-9);
        assert!((buys["b"] - 100.0 * 0.395 / 0.995).abs() < 1e-9);
    }

    #[test]
    fn no_free_cash_means_no_plan() {
        let buys = allocate(
            &totals(&[("a", 60.0), ("b", 40.0)]),
            100.0,
            &totals(&[("a", 0.5), ("b", 0.5)]),
            0.0,
        );
        assert!(buys.is_empty());
    }

    #[test]
    fn negative_free_cash_means_no_plan() {
        let buys = allocate(
            &totals(&[("a", 60.0)]),
            60.0,
            &totals(&[("a", 1.0)]),
            -500.0,
        );
        assert!(buys.is_empty());
    }

    #[test]
    fn all_at_target_splits_evenly() {
        let buys = allocate(
            &totals(&[("a", 50.0), ("b", 50.0)]),
            100.0,
            &totals(&[("a", 0.5), ("b", 0.5)]),
            20.0,
        );
        assert!((buys["a"] - 10.0).abs() < 1e-9);
        assert!((buys["b"] - 10.0).abs() < 1e-9);
    }

    #[test]
    fn lagging_group_funded_first_then_spillover_splits() {
        // a holds nothing; b and c are both well over their targets. Cash is
        // enough to bring a to target (exactly $40 asymptotically) with $30
        // to spare, which spills evenly across all three groups.
        let buys = allocate(
            &totals(&[("b", 30.0), ("c", 30.0)]),
            60.0,
            &totals(&[("a", 0.4), ("b", 0.3), ("c", 0.3)]),
            70.0,
        );
        assert!((sum(&buys) - 70.0).abs() < 1e-6);
        assert!((buys["a"] - 50.0).abs() < 1e-4);
        assert!((buys["b"] - 10.0).abs() < 1e-4);
        assert!((buys["c"] - 10.0).abs() < 1e-4);
        assert!((buys["b"] - buys["c"]).abs() < 1e-9);
    }

    #[test]
    fn over_target_group_gets_nothing_while_cash_lasts() {
        // Bringing a to target would take $80; only $20 is available, so b
        // never sees an allocation.
        let buys = allocate(
            &totals(&[("b", 80.0)]),
            80.0,
            &totals(&[("a", 0.5), ("b", 0.5)]),
            20.0,
        );
        assert!((buys["a"] - 20.0).abs() < 1e-9);
        assert!(!buys.contains_key("b"));
    }

    #[test]
    fn allocations_sum_to_free_cash() {
        let buys = allocate(
            &totals(&[("a", 123.45), ("b", 678.9), ("c", 42.0)]),
            844.35,
            &totals(&[("a", 0.5), ("b", 0.3), ("c", 0.2)]),
            500.0,
        );
        assert!((sum(&buys) - 500.0).abs() < 1e-6);
        assert!(buys.values().all(|&v| v >= 0.0));
    }

    #[test]
    fn deterministic_across_runs() {
        let group_totals = totals(&[("a", 10.0), ("b", 200.0), ("c", 55.5)]);
        let targets = totals(&[("a", 0.4), ("b", 0.35), ("c", 0.25)]);
        let first = allocate(&group_totals, 265.5, &targets, 321.0);
        let second = allocate(&group_totals, 265.5, &targets, 321.0);
        assert_eq!(first, second);
    }

    #[test]
    fn group_missing_from_totals_is_treated_as_zero() {
        // "a" has no entry at all, equivalent to holding $0.
        let buys = allocate(
            &totals(&[("b", 80.0)]),
            80.0,
            &totals(&[("a", 0.5), ("b", 0.5)]),
            100.0,
        );
        assert!((sum(&buys) - 100.0).abs() < 1e-6);
        assert!(buys["a"] > buys.get("b").copied().unwrap_or(0.0));
    }

    #[test]
    fn targeted_rounds_never_push_past_target() {
        // Cash runs out before the lagging group reaches target, so its
        // final share must still be at or below target.
        let group_totals = totals(&[("a", 0.0), ("b", 60.0)]);
        let targets = totals(&[("a", 0.5), ("b", 0.5)]);
        let free_cash = 30.0;
        let buys = allocate(&group_totals, 60.0, &targets, free_cash);
        let after_a = buys.get("a").copied().unwrap_or(0.0) / (60.0 + free_cash);
        assert!(after_a <= 0.5 + 1e-9);
        assert!((sum(&buys) - 30.0).abs() < 1e-6);
    }
}
