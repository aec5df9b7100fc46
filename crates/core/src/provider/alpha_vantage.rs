//! Alpha Vantage data source implementation.
//!
//! Fundamentals come from the OVERVIEW endpoint; the symbol universe comes
//! from the LISTING_STATUS CSV endpoint. The free tier signals throttling
//! through payload note fields rather than HTTP 429, so payload anomalies
//! are checked before any field is trusted.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{FundamentalsSource, SymbolUniverseSource};
use crate::client::ApiClient;
use crate::errors::FetchError;
use crate::models::{parse_yield, FundamentalsRecord, Sector};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Alpha Vantage data source.
///
/// Construction requires the API credential; a missing credential is
/// rejected at configuration time, never mid-fetch.
pub struct AlphaVantageSource {
    client: ApiClient,
    api_key: String,
}

/// OVERVIEW response.
///
/// Only the fields the pipeline consumes are mapped; the API returns many
/// more. Every field is optional because anomalous responses (bad symbol,
/// throttling) come back as sparse JSON objects with 200 status.
#[derive(Debug, Deserialize)]
struct OverviewResponse {
    #[serde(rename = "Symbol")]
    symbol: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Sector")]
    sector: Option<String>,
    #[serde(rename = "DividendYield")]
    dividend_yield: Option<String>,

    // Anomaly signalling
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// One row of the LISTING_STATUS CSV. Columns the pipeline ignores
/// (exchange, IPO date) are simply not mapped.
#[derive(Debug, Deserialize)]
struct ListingRow {
    symbol: String,
    #[serde(rename = "assetType")]
    asset_type: String,
    status: String,
}

impl AlphaVantageSource {
    pub fn new(api_key: String, client: ApiClient) -> Self {
        Self { client, api_key }
    }

    /// Build a query URL with the credential appended.
    fn query_url(&self, params: &[(&str, &str)]) -> Result<Url, FetchError> {
        let mut all_params: Vec<(&str, &str)> = params.to_vec();
        all_params.push(("apikey", &self.api_key));

        Url::parse_with_params(BASE_URL, &all_params).map_err(|e| FetchError::Validation {
            status: None,
            message: format!("Failed to build request URL: {}", e),
        })
    }

    /// Check the parsed payload for API-level anomalies.
    ///
    /// The checks run in precedence order: an explicit error payload wins
    /// over a throttle note, which wins over a missing identifier. Only a
    /// payload clearing all three is trusted.
    fn check_api_error(response: &OverviewResponse, symbol: &str) -> Result<(), FetchError> {
        if let Some(message) = &response.error_message {
            debug!("Alpha Vantage error payload for {}: {}", symbol, message);
            return Err(FetchError::Validation {
                status: None,
                message: format!("Invalid symbol: {}", symbol),
            });
        }

        if let Some(note) = response.note.as_ref().or(response.information.as_ref()) {
            warn!("Alpha Vantage throttle note for {}: {}", symbol, note);
            return Err(FetchError::RateLimit { retry_after: None });
        }

        if response.symbol.is_none() {
            return Err(FetchError::Validation {
                status: None,
                message: format!("No data for symbol: {}", symbol),
            });
        }

        Ok(())
    }

    /// Map a trusted payload to the normalized record.
    fn to_record(response: &OverviewResponse, symbol: &str) -> FundamentalsRecord {
        FundamentalsRecord {
            symbol: symbol.to_string(),
            display_name: response.name.clone().unwrap_or_else(|| symbol.to_string()),
            sector_label: Sector::from_raw(response.sector.as_deref()),
            dividend_yield_percent: parse_yield(response.dividend_yield.as_deref()),
        }
    }

    /// Extract active stock symbols from the LISTING_STATUS CSV.
    fn parse_listing(csv_text: &str) -> Vec<String> {
        let mut reader = csv::ReaderBuilder::new().from_reader(csv_text.as_bytes());
        let mut symbols = Vec::new();

        for row in reader.deserialize::<ListingRow>() {
            match row {
                Ok(row) => {
                    if row.asset_type == "Stock" && row.status == "Active" {
                        symbols.push(row.symbol.to_uppercase());
                    }
                }
                Err(e) => warn!("Skipping malformed listing row: {}", e),
            }
        }

        symbols
    }
}

#[async_trait]
impl FundamentalsSource for AlphaVantageSource {
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsRecord, FetchError> {
        let url = self.query_url(&[("function", "OVERVIEW"), ("symbol", symbol)])?;
        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let response: OverviewResponse = self.client.get_json(url).await?;
        Self::check_api_error(&response, symbol)?;

        debug!("Fetched fundamentals for {}", symbol);
        Ok(Self::to_record(&response, symbol))
    }
}

#[async_trait]
impl SymbolUniverseSource for AlphaVantageSource {
    async fn active_symbols(&self) -> Result<Vec<String>, FetchError> {
        let url = self.query_url(&[("function", "LISTING_STATUS")])?;
        debug!(
            "Alpha Vantage request: {}",
            url.as_str().replace(&self.api_key, "***")
        );

        let body = self.client.get_text(url).await?;
        let symbols = Self::parse_listing(&body);

        if symbols.is_empty() {
            return Err(FetchError::Validation {
                status: None,
                message: "Listing endpoint returned no active stocks".to_string(),
            });
        }

        debug!("Fetched {} active symbols", symbols.len());
        Ok(symbols)
    }
}
