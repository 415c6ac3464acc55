//! Position normalizer: raw CSV rows from the brokerage feed into typed
//! records.
//!
//! The feed is a headered CSV snapshot with currency-formatted numeric
//! columns ("$1,234.56", "+0.43%") and an unstructured footer after the
//! first blank line. Values the brokerage cannot price come through as the
//! literal `n/a`.

use std::collections::HashMap;

use rustc_hash::FxHashMap;

use crate::error::{Error, Result};

/// Columns that must coerce to a float.
const NUMERIC_FIELDS: [&str; 10] = [
    "Quantity",
    "Last Price",
    "Last Price Change",
    "Current Value",
    "Today's Gain/Loss Dollar",
    "Today's Gain/Loss Percent",
    "Total Gain/Loss Dollar",
    "Total Gain/Loss Percent",
    "Cost Basis Per Share",
    "Cost Basis Total",
];

/// A normalized holding.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub last_price: f64,
    pub current_value: f64,
}

/// Parse a currency-formatted value: `n/a` maps to NaN, everything that is
/// not a digit or decimal point is stripped before parsing.
fn parse_amount(field: &str, raw: &str) -> Result<f64> {
    if raw == "n/a" {
        return Ok(f64::NAN);
    }
    let stripped: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    stripped.parse::<f64>().map_err(|_| Error::Field {
        field: field.to_string(),
        value: raw.to_string(),
    })
}

/// Normalize one raw record. Every designated numeric column present in the
/// record must parse; the symbol is trimmed of trailing `*` markers.
pub fn normalize(record: &HashMap<String, String>) -> Result<Position> {
    let mut numeric: FxHashMap<&str, f64> = FxHashMap::default();
    for field in NUMERIC_FIELDS {
        if let Some(raw) = record.get(field) {
            numeric.insert(field, parse_amount(field, raw)?);
        }
    }

    let symbol = record
        .get("Symbol")
        .ok_or_else(|| Error::Positions("missing 'Symbol' column".into()))?
        .trim_end_matches('*')
        .to_string();

    let require = |field: &str| -> Result<f64> {
        numeric
            .get(field)
            .copied()
            .ok_or_else(|| Error::Positions(format!("missing '{field}' column")))
    };

    Ok(Position {
        symbol,
        quantity: require("Quantity")?,
        last_price: require("Last Price")?,
        current_value: require("Current Value")?,
    })
}

/// Drop the feed footer: everything at and after the first blank line.
fn trim_footer(text: &str) -> String {
    text.lines()
        .take_while(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse the full positions CSV snapshot into normalized positions.
pub fn parse_positions_csv(text: &str) -> Result<Vec<Position>> {
    let body = trim_footer(text);
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let mut positions = Vec::new();
    for row in reader.deserialize() {
        let record: HashMap<String, String> = row?;
        positions.push(normalize(&record)?);
    }
    Ok(positions)
}
