//! External data source traits and implementations.
//!
//! The traits here are the seam between the fetch services and the concrete
//! external API. Services depend on the traits only; tests substitute mock
//! implementations with scripted outcomes.

pub mod alpha_vantage;

pub use alpha_vantage::AlphaVantageSource;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::FundamentalsRecord;

/// A source of per-symbol fundamentals.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    /// Fetch and normalize fundamentals for one symbol.
    ///
    /// Callers pass the symbol already upper-cased. Implementations map
    /// external failures into the closed [`FetchError`] taxonomy and never
    /// return a record built from an anomalous payload.
    async fn fundamentals(&self, symbol: &str) -> Result<FundamentalsRecord, FetchError>;
}

/// A source of the tradable symbol universe.
#[async_trait]
pub trait SymbolUniverseSource: Send + Sync {
    /// Fetch the full list of active, regular-stock symbols.
    async fn active_symbols(&self) -> Result<Vec<String>, FetchError>;
}
