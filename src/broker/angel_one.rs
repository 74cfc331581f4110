/// Angel One SmartAPI REST client (quotes only)
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::broker::session::SessionManager;
use crate::data::QuoteSource;
use crate::error::{Result, TradingError};

const BASE_URL: &str = "https://apiconnect.angelbroking.com";
const LTP_PATH: &str = "/rest/secure/angelbroking/order/v1/getLtpData";

#[derive(Debug, Serialize)]
struct LtpRequest<'a> {
    exchange: &'a str,
    #[serde(rename = "tradingsymbol")]
    trading_symbol: &'a str,
    #[serde(rename = "symboltoken")]
    symbol_token: &'a str,
}

#[derive(Debug, Deserialize)]
struct LtpResponse {
    status: bool,
    #[serde(default)]
    message: String,
    #[serde(rename = "errorcode", default)]
    error_code: Option<String>,
    data: Option<LtpData>,
}

#[derive(Debug, Deserialize)]
struct LtpData {
    ltp: f64,
}

/// SmartAPI client; authenticates with the JWT held by the session manager
pub struct AngelOneClient {
    client: Client,
    session: Arc<SessionManager>,
    api_key: String,
    base_url: String,
}

impl AngelOneClient {
    pub fn new(session: Arc<SessionManager>, api_key: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(AngelOneClient {
            client,
            session,
            api_key,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (sandbox or a local stub)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Last traded price for one instrument
    pub async fn get_ltp(&self, exchange: &str, symbol: &str, token: &str) -> Result<f64> {
        let jwt = self.session.bearer().await?;
        let payload = LtpRequest {
            exchange,
            trading_symbol: symbol,
            symbol_token: token,
        };

        let response = self
            .client
            .post(format!("{}{}", self.base_url, LTP_PATH))
            .header("Authorization", format!("Bearer {}", jwt))
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("X-UserType", "USER")
            .header("X-SourceID", "WEB")
            .header("X-ClientLocalIP", "127.0.0.1")
            .header("X-ClientPublicIP", "127.0.0.1")
            .header("X-MACAddress", "00:00:00:00:00:00")
            .header("X-PrivateKey", &self.api_key)
            .json(&payload)
            .send()
            .await?;

        let body = response.text().await?;
        let ltp = parse_ltp_response(&body)?;
        debug!("LTP {} ({}): {:.2}", symbol, token, ltp);
        Ok(ltp)
    }
}

impl QuoteSource for AngelOneClient {
    fn ltp<'a>(&'a self, exchange: &'a str, symbol: &'a str, token: &'a str) -> BoxFuture<'a, Result<f64>> {
        self.get_ltp(exchange, symbol, token).boxed()
    }
}

fn parse_ltp_response(body: &str) -> Result<f64> {
    let response: LtpResponse = serde_json::from_str(body)?;

    if !response.status {
        return Err(TradingError::BrokerApiError {
            code: response.error_code.unwrap_or_default(),
            message: response.message,
        });
    }

    response
        .data
        .map(|d| d.ltp)
        .ok_or_else(|| TradingError::MissingData("No LTP data".to_string()))
}
