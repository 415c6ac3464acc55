//! Group aggregator: rolls normalized positions up into per-group dollar
//! totals and extracts the investable cash surplus.

use log::{debug, warn};
use rustc_hash::FxHashMap;

use crate::config::GroupsConfig;
use crate::error::{Error, Result};
use crate::position::Position;

/// Current holdings rolled up by asset-class group.
#[derive(Debug, Clone)]
pub struct HoldingsSummary {
    /// Dollars currently held per group (mapped symbols only).
    pub group_totals: FxHashMap<String, f64>,
    /// Sum of `group_totals` values.
    pub grand_total: f64,
    /// Cash position value minus the configured buffer. May be negative.
    pub free_cash: f64,
}

/// Sum current value per group and find the free cash.
///
/// Positions whose symbol is not in the symbol-group table are skipped
/// entirely, including from the grand total. The cash position itself is
/// never mapped to a group; it only contributes the investable surplus.
pub fn summarize(positions: &[Position], groups: &GroupsConfig) -> Result<HoldingsSummary> {
    let mut group_totals: FxHashMap<String, f64> = FxHashMap::default();
    let mut grand_total = 0.0;

    for position in positions {
        let Some(group) = groups.symbol_groups.get(&position.symbol) else {
            debug!("skipping unmapped symbol {}", position.symbol);
            continue;
        };
        if !position.current_value.is_finite() {
            return Err(Error::Positions(format!(
                "current value for {} is not a number",
                position.symbol
            )));
        }
        *group_totals.entry(group.clone()).or_insert(0.0) += position.current_value;
        grand_total += position.current_value;
    }

    let cash = positions
        .iter()
        .find(|p| p.symbol == groups.cash_symbol)
        .ok_or_else(|| Error::CashPositionMissing(groups.cash_symbol.clone()))?;
    if !cash.current_value.is_finite() {
        return Err(Error::Positions(format!(
            "cash position {} has no value",
            cash.symbol
        )));
    }

    let free_cash = cash.current_value - groups.cash_buffer;
    if free_cash <= 0.0 {
        warn!(
            "no investable cash: {} holds ${:.2}, buffer is ${:.2}",
            cash.symbol, cash.current_value, groups.cash_buffer
        );
    }

    Ok(HoldingsSummary {
        group_totals,
        grand_total,
        free_cash,
    })
}
