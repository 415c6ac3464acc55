//! Brokerage abstraction used by the workflows, plus a mock for tests.

use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::position::Position;

/// Minimal brokerage API the rebalancer needs: a session, the current
/// holdings, and a fixed dollar-amount mutual-fund buy.
pub trait Brokerage {
    /// Establish an authenticated session.
    fn login(&mut self) -> Result<()>;

    /// Fetch all current positions, including the cash position.
    fn positions(&self) -> Result<Vec<Position>>;

    /// Buy `amount_usd` dollars of `symbol`. Either succeeds or fails as a
    /// whole; the caller does not interpret results further.
    fn buy(&self, symbol: &str, amount_usd: f64) -> Result<()>;
}

/// A buy recorded by the mock, for assertion in tests.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBuy {
    pub symbol: String,
    pub amount_usd: f64,
}

/// Builder for `MockBrokerage`.
pub struct MockBrokerageBuilder {
    positions: Vec<Position>,
    reject_buys: bool,
}

impl MockBrokerageBuilder {
    pub fn with_position(mut self, symbol: &str, quantity: f64, current_value: f64) -> Self {
        let last_price = if quantity != 0.0 {
            current_value / quantity
        } else {
            0.0
        };
        self.positions.push(Position {
            symbol: symbol.to_string(),
            quantity,
            last_price,
            current_value,
        });
        self
    }

    /// Make every buy fail, to exercise abort paths.
    pub fn reject_buys(mut self) -> Self {
        self.reject_buys = true;
        self
    }

    pub fn build(self) -> MockBrokerage {
        MockBrokerage {
            logged_in: false,
            positions: self.positions,
            reject_buys: self.reject_buys,
            buys: Mutex::new(Vec::new()),
        }
    }
}

/// In-memory brokerage that records submitted buys.
pub struct MockBrokerage {
    logged_in: bool,
    positions: Vec<Position>,
    reject_buys: bool,
    buys: Mutex<Vec<RecordedBuy>>,
}

impl MockBrokerage {
    pub fn builder() -> MockBrokerageBuilder {
        MockBrokerageBuilder {
            positions: Vec::new(),
            reject_buys: false,
        }
    }

    /// All buys submitted so far (for assertion in tests).
    pub fn submitted_buys(&self) -> Vec<RecordedBuy> {
        self.buys.lock().unwrap().clone()
    }
}

impl Brokerage for MockBrokerage {
    fn login(&mut self) -> Result<()> {
        self.logged_in = true;
        Ok(())
    }

    fn positions(&self) -> Result<Vec<Position>> {
        if !self.logged_in {
            return Err(Error::Login("not logged in".into()));
        }
        Ok(self.positions.clone())
    }

    fn buy(&self, symbol: &str, amount_usd: f64) -> Result<()> {
        if !self.logged_in {
            return Err(Error::Login("not logged in".into()));
        }
        if self.reject_buys {
            return Err(Error::Trade(format!("mock: buy of {symbol} rejected")));
        }
        self.buys.lock().unwrap().push(RecordedBuy {
            symbol: symbol.to_string(),
            amount_usd,
        });
        Ok(())
    }
}
