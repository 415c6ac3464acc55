//! Workflow orchestration: calculate, execute, positions, status.
//!
//! Calculate and execute are deliberately separate invocations bridged by
//! the plan file, so a human can review the printed table before any money
//! moves.

use std::path::Path;

use log::{error, info, warn};

use crate::aggregate;
use crate::allocate;
use crate::brokerage::Brokerage;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::plan::AllocationPlan;
use crate::report::PlanReport;

/// Options for the execute workflow.
pub struct ExecuteOptions {
    /// Skip the confirmation prompt.
    pub force: bool,
}

/// Compute and persist a fresh allocation plan from current holdings.
pub fn calculate<B: Brokerage>(config: &Config, broker: &mut B, plan_path: &Path) -> Result<()> {
    // Drop any stale, unexecuted plan before recomputing.
    AllocationPlan::clear(plan_path)?;

    broker.login()?;
    let positions = broker.positions()?;
    let summary = aggregate::summarize(&positions, &config.groups)?;

    info!(
        "holdings: ${:.2} across {} groups, free cash ${:.2}",
        summary.grand_total,
        summary.group_totals.len(),
        summary.free_cash
    );

    if summary.free_cash <= 0.0 {
        println!(
            "No investable cash (${:.2} after the ${:.2} buffer) — no plan written.",
            summary.free_cash, config.groups.cash_buffer
        );
        return Ok(());
    }

    let buys = allocate::allocate(
        &summary.group_totals,
        summary.grand_total,
        &config.groups.targets,
        summary.free_cash,
    );

    let report = PlanReport::new(&summary, &buys, &config.groups.targets);
    print!("{report}");

    let plan = AllocationPlan::new(buys);
    plan.save(plan_path)?;
    println!(
        "\nPlan for ${:.2} saved to {} — review, then run `autofolio execute`.",
        plan.total(),
        plan_path.display()
    );
    Ok(())
}

/// Submit the buys from the persisted plan, then delete it.
///
/// The first failed buy aborts the remaining batch; already-submitted buys
/// are irreversible, and the plan file is left in place for inspection.
pub fn execute<B: Brokerage>(
    config: &Config,
    broker: &mut B,
    plan_path: &Path,
    opts: &ExecuteOptions,
) -> Result<()> {
    let plan = AllocationPlan::load(plan_path)?;

    let mut orders: Vec<(&String, f64)> = plan.buys.iter().map(|(g, &a)| (g, a)).collect();
    orders.sort_by(|x, y| y.1.total_cmp(&x.1).then_with(|| x.0.cmp(y.0)));

    println!(
        "Plan from {}: {} orders, ${:.2} total",
        plan.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        orders.len(),
        plan.total()
    );
    for (group, amount) in &orders {
        let symbol = group_symbol(config, group)?;
        println!("  {group:<12} {symbol:<8} ${amount:>10.2}");
    }

    if !opts.force {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt("Execute?")
            .default(false)
            .interact()
            .map_err(|e| Error::Aborted(format!("confirmation prompt failed: {e}")))?;
        if !confirmed {
            println!("Aborted — plan left in place.");
            return Ok(());
        }
    }

    broker.login()?;

    let total = orders.len();
    for (i, (group, amount)) in orders.iter().enumerate() {
        let symbol = group_symbol(config, group)?;
        if *amount < 0.01 {
            warn!("skipping {group}: ${amount:.2} is below the wire minimum");
            continue;
        }
        print!("[{}/{}] BUY ${:.2} {} ({}) ... ", i + 1, total, amount, symbol, group);
        match broker.buy(symbol, *amount) {
            Ok(()) => println!("OK"),
            Err(e) => {
                println!("FAILED");
                error!("buy failed for {group} ({symbol}): {e}");
                return Err(e);
            }
        }
    }

    AllocationPlan::clear(plan_path)?;
    println!("{total} orders submitted. Plan cleared.");
    Ok(())
}

/// Show current holdings with their group mapping.
pub fn show_positions<B: Brokerage>(config: &Config, broker: &mut B) -> Result<()> {
    broker.login()?;
    let positions = broker.positions()?;

    println!(
        "{:<10} {:>12} {:>10} {:>12}  {}",
        "symbol", "quantity", "price$", "value$", "group"
    );
    for p in &positions {
        let group = config
            .groups
            .symbol_groups
            .get(&p.symbol)
            .map(String::as_str)
            .unwrap_or("-");
        println!(
            "{:<10} {:>12.3} {:>10.2} {:>12.2}  {}",
            p.symbol, p.quantity, p.last_price, p.current_value, group
        );
    }
    Ok(())
}

/// Verify that the brokerage session can be established.
pub fn check_status<B: Brokerage>(broker: &mut B) -> Result<()> {
    broker.login()?;
    println!("Login OK.");
    Ok(())
}

fn group_symbol<'a>(config: &'a Config, group: &str) -> Result<&'a str> {
    config
        .groups
        .symbols
        .get(group)
        .map(String::as_str)
        .ok_or_else(|| {
            Error::Config(format!(
                "no tradable symbol configured for group '{group}'"
            ))
        })
}
