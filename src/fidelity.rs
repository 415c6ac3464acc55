//! Fidelity HTTP client: session login, positions snapshot, and the
//! three-step mutual-fund order protocol (init, verify, confirm).
//!
//! All calls are synchronous and blocking; the session cookie jar lives in
//! the reqwest client.

use log::{debug, info};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;

use crate::brokerage::Brokerage;
use crate::config::CredentialsConfig;
use crate::error::{Error, Result};
use crate::position::{self, Position};

const LOGIN_INIT_URL: &str = "https://login.fidelity.com/ftgw/Fas/Fidelity/RtlCust/Login/Init";
const LOGIN_RESPONSE_URL: &str =
    "https://login.fidelity.com/ftgw/Fas/Fidelity/RtlCust/Login/Response";
const POSITIONS_URL: &str =
    "https://oltx.fidelity.com/ftgw/fbc/ofpositions/snippet/portfolioPositions";
const TRADE_INIT_URL: &str = "https://oltx.fidelity.com/ftgw/fbc/oftrade/rest/mfPlaceOrderInit";
const TRADE_VERIFY_URL: &str = "https://oltx.fidelity.com/ftgw/fbc/oftrade/rest/mfPlaceOrderVerify";
const TRADE_CONFIRM_URL: &str =
    "https://oltx.fidelity.com/ftgw/fbc/oftrade/rest/mfPlaceOrderConfirm";

/// Marker present in the login response body on success.
const LOGIN_OK_MARKER: &str = "Redirect to Default Page";

const JSON_ACCEPT: &str = "application/json, text/javascript, */*; q=0.01";

/// Fixed order-type constants for a dollar-amount mutual-fund buy.
const ORDER_TYPE: &str = "M";
const ORDER_ACTION: &str = "BF";
const PRODUCT: &str = "ANGRBE";

/// Authenticated Fidelity session.
pub struct FidelityClient {
    http: Client,
    credentials: CredentialsConfig,
}

impl FidelityClient {
    pub fn new(credentials: CredentialsConfig) -> Result<Self> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self { http, credentials })
    }

    fn trade_init(&self) -> Result<()> {
        let form = [
            ("ACCOUNT", self.credentials.account.as_str()),
            ("ORDER_TYPE", ORDER_TYPE),
            ("PRODUCT", PRODUCT),
            ("CACHE_DATA", "N"),
        ];
        self.http
            .post(TRADE_INIT_URL)
            .header(ACCEPT, JSON_ACCEPT)
            .form(&form)
            .send()?
            .error_for_status()?;
        Ok(())
    }

    fn trade_verify(&self, symbol: &str, amount_usd: f64) -> Result<String> {
        // The brokerage rejects amounts with more than two decimals.
        let amount = format!("{amount_usd:.2}");
        let form = [
            ("ACCOUNT", self.credentials.account.as_str()),
            ("FUND", "on"),
            ("ORDER_TYPE", ORDER_TYPE),
            ("SYMBOL", symbol),
            ("QTY_TYPE_D", amount.as_str()),
            ("QTY", ""),
            ("QTY_TYPE_S", ""),
            ("QTY_TYPE_A", ""),
            ("ORDER_ACTION", ORDER_ACTION),
            ("ACCT_TYPE", "C"),
            ("PRODUCT", PRODUCT),
            ("FUND_NEW", ""),
        ];
        let response: serde_json::Value = self
            .http
            .post(TRADE_VERIFY_URL)
            .header(ACCEPT, JSON_ACCEPT)
            .form(&form)
            .send()?
            .error_for_status()?
            .json()?;

        let order_num = response
            .get("mutualFundVerify")
            .and_then(|v| v.get("order"))
            .and_then(|v| v.get("orderNum"))
            .ok_or_else(|| {
                Error::Trade(format!("verify response for {symbol} has no order number"))
            })?;

        Ok(match order_num {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    fn trade_confirm(&self, symbol: &str, amount_usd: f64, order_num: &str) -> Result<()> {
        let amount = format!("{amount_usd:.2}");
        let form = [
            ("ACCOUNT", self.credentials.account.as_str()),
            ("ACCT_TYPE", "C"),
            ("QTY_TYPE", "D"),
            ("QTY_TYPE_D", amount.as_str()),
            ("QTY_TYPE_S", amount.as_str()),
            ("ORDER_ACTION", ORDER_ACTION),
            ("SYMBOL", symbol),
            ("FUND_NEW", ""),
            ("PRODUCT", PRODUCT),
            ("ORDER_NUM", order_num),
            ("ORDER_TYPE", ORDER_TYPE),
        ];
        self.http
            .post(TRADE_CONFIRM_URL)
            .header(ACCEPT, JSON_ACCEPT)
            .form(&form)
            .send()?
            .error_for_status()?;
        Ok(())
    }
}

impl Brokerage for FidelityClient {
    fn login(&mut self) -> Result<()> {
        info!("Logging in to Fidelity...");
        self.http.get(LOGIN_INIT_URL).send()?.error_for_status()?;

        let form = [
            ("SSN", self.credentials.username.as_str()),
            ("PIN", self.credentials.password.as_str()),
            ("SavedIdInd", "N"),
        ];
        let body = self
            .http
            .post(LOGIN_RESPONSE_URL)
            .form(&form)
            .send()?
            .error_for_status()?
            .text()?;

        if !body.contains(LOGIN_OK_MARKER) {
            return Err(Error::Login("unexpected login response".into()));
        }
        info!("Login OK");
        Ok(())
    }

    fn positions(&self) -> Result<Vec<Position>> {
        // The snippet endpoint wants the full display parameter set to
        // return the CSV export. Duplicate show-type keys are intentional.
        let query: &[(&str, &str)] = &[
            ("SAVE_SETTINGS_WASH_SALE", "N"),
            ("UNADJUSTED_COST_BASIS_INFORMATION", ""),
            ("EXCLUDE_WASH_SALE_IND", ""),
            ("SHOW_FOREIGN_CURRENCY", ""),
            ("REFRESH_DATA", "N"),
            ("REPRICE_FROM_CACHE", "Y"),
            ("ALL_POS", "Y"),
            ("ALL_ACCTS", "Y"),
            ("TXN_SORT_ORDER", "0"),
            ("TABLE_SORT_ORDER", "0"),
            ("TABLE_SORT_DIRECTION", "A"),
            ("SAVE_SETTINGS", "N"),
            ("pf", "N"),
            ("CSV", "Y"),
            ("TXN_COLUMN_SORT_JSON_INFO", ""),
            ("SORT_COL_IND", ""),
            ("IS_ACCOUNT_CHANGED", "Y"),
            ("DISP_FULL_DESC", "Y"),
            ("FONT_SIZE", "S"),
            ("viewBy", ""),
            ("displayBy", ""),
            ("group-by", "0"),
            ("desc", "0"),
            ("NEXTGEN", "Y"),
            ("ACTION", ""),
            ("SHOW_FULL_SECURITY_NAME", "N"),
            ("REQUESTED_SHOW_TYPE_IND", "All"),
            ("REQUESTED_SHOW_TYPE_IND", "Mutual Funds"),
            ("REQUESTED_SHOW_TYPE_IND", "Cash"),
            ("REQUESTED_SHOW_TYPE_IND", "Stocks/ETFs"),
        ];

        let body = self
            .http
            .get(POSITIONS_URL)
            .query(query)
            .send()?
            .error_for_status()?
            .text()?;

        let positions = position::parse_positions_csv(&body)?;
        info!("Fetched {} positions", positions.len());
        Ok(positions)
    }

    fn buy(&self, symbol: &str, amount_usd: f64) -> Result<()> {
        debug!("trade init for {symbol}");
        self.trade_init()?;
        let order_num = self.trade_verify(symbol, amount_usd)?;
        debug!("trade verify for {symbol}: order {order_num}");
        self.trade_confirm(symbol, amount_usd, &order_num)?;
        Ok(())
    }
}
