use serde::{Deserialize, Serialize};

/// Closed set of display sectors plus [`Unknown`](Self::Unknown).
///
/// Raw provider labels are folded into these six categories via
/// [`from_raw`](Self::from_raw). The mapping is many-to-one and total:
/// unmapped or missing input yields `Unknown`, never an error.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Sector {
    Technology,
    Financials,
    Healthcare,
    Consumer,
    Industrials,
    Energy,
    Unknown,
}

impl Sector {
    /// Map a raw provider sector label to its display category.
    ///
    /// Matching is case-insensitive and ignores surrounding whitespace.
    /// The provider mixes two label vocabularies (consumer-facing ones like
    /// "Consumer Cyclical" and filing-derived ones like "Trade & Services");
    /// both are covered. The source tables list "Basic Materials" twice
    /// under different categories; only the first mapping is kept, the
    /// shadowed one is unreachable.
    pub fn from_raw(raw: Option<&str>) -> Self {
        let Some(label) = raw else {
            return Self::Unknown;
        };

        match label.trim().to_lowercase().as_str() {
            "technology" | "communication services" => Self::Technology,
            "financial services" | "finance" | "real estate" | "real estate & construction" => {
                Self::Financials
            }
            "healthcare" | "life sciences" => Self::Healthcare,
            "consumer cyclical" | "consumer defensive" | "trade & services" => Self::Consumer,
            "basic materials" | "industrials" | "manufacturing" => Self::Industrials,
            "energy" | "utilities" | "energy & transportation" => Self::Energy,
            _ => Self::Unknown,
        }
    }

    /// The display label, identical to the serialized form.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Financials => "Financials",
            Self::Healthcare => "Healthcare",
            Self::Consumer => "Consumer",
            Self::Industrials => "Industrials",
            Self::Energy => "Energy",
            Self::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
