//! autofolio: automated mutual-fund portfolio rebalancer.
//!
//! Reads current holdings from the brokerage, aggregates them into
//! asset-class groups, and computes how to spend the account's free cash so
//! the portfolio moves toward its target weights. The plan is printed for
//! review and persisted; a separate `execute` invocation submits one
//! dollar-amount buy per group.

pub mod aggregate;
pub mod allocate;
pub mod brokerage;
pub mod config;
pub mod error;
pub mod execution;
pub mod fidelity;
pub mod plan;
pub mod position;
pub mod report;
