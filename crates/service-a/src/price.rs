//! Bitcoin spot price lookups against the CoinGecko simple-price API.

use std::collections::HashMap;
use std::time::Duration;

use crate::error::{PriceError, Result};

pub const DEFAULT_API_BASE: &str = "https://api.coingecko.com";
const PRICE_PATH: &str = "/api/v3/simple/price";
const API_KEY_HEADER: &str = "x-cg-pro-api-key";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Anything that can produce the current price. The worker only sees this.
pub trait PriceSource {
    fn fetch(&self) -> Result<f64>;
}

pub struct CoinGecko {
    http: reqwest::blocking::Client,
    base_url: String,
    currency: String,
    api_key: Option<String>,
}

impl CoinGecko {
    pub fn new(
        base_url: impl Into<String>,
        currency: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            currency: currency.into().to_lowercase(),
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }
}

impl PriceSource for CoinGecko {
    fn fetch(&self) -> Result<f64> {
        let mut req = self
            .http
            .get(format!("{}{PRICE_PATH}", self.base_url))
            .query(&[("ids", "bitcoin"), ("vs_currencies", self.currency.as_str())]);
        if let Some(key) = &self.api_key {
            req = req.header(API_KEY_HEADER, key);
        }

        let body: HashMap<String, HashMap<String, f64>> =
            req.send()?.error_for_status()?.json()?;

        body.get("bitcoin")
            .and_then(|quotes| quotes.get(&self.currency))
            .copied()
            .ok_or_else(|| PriceError::MissingQuote(self.currency.clone()))
    }
}
