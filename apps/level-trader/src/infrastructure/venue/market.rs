//! Paper market document
//!
//! Listings, tick rule tables, trading hours and scripted quote steps the
//! paper venue serves. Loaded from YAML:
//!
//! ```yaml
//! listings:
//!   - { con_id: 1, symbol: XYZ, rule_id: 26 }
//!   - { con_id: 2, symbol: XYZ, right: Call, strike: "101", expiration: 2024-03-15, rule_id: 26 }
//! rules:
//!   - { id: 26, rules: [{ threshold: "0", increment: "0.01" }] }
//! liquid_hours: "20240315:0930-20240315:1600"
//! steps:
//!   - { after_secs: 5, local_symbol: XYZ, bid: "100.9", ask: "101.1", last: "101" }
//!   - { after_secs: 60, local_symbol: XYZ, fill_size: "2" }
//! ```

use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::domain::market::{Contract, ContractKind, ContractSpec, MarketRuleRef, OptionRight};
use crate::domain::pricing::{TickRule, TickRuleError, TickRuleTable};
use crate::domain::shared::Symbol;

/// Paper market errors.
#[derive(Debug, thiserror::Error)]
pub enum PaperMarketError {
    /// The file could not be read.
    #[error("Failed to read paper market file {path}: {source}")]
    Read {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a valid paper market document.
    #[error("Failed to parse paper market: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// A rule table is invalid.
    #[error("Invalid market rule {id}: {source}")]
    Rules {
        /// Rule table id.
        id: i32,
        /// Validation error.
        #[source]
        source: TickRuleError,
    },

    /// A listing carries a multiplier that is not positive.
    #[error("Listing {con_id} has non-positive multiplier {multiplier}")]
    Multiplier {
        /// Venue contract id.
        con_id: i64,
        /// Configured multiplier.
        multiplier: Decimal,
    },
}

/// One contract the paper venue resolves.
///
/// A listing with a right, strike and expiration is an option; anything else
/// is a stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperListing {
    /// Venue contract id.
    pub con_id: i64,
    /// Underlying symbol.
    pub symbol: String,
    /// Trading currency.
    #[serde(default = "default_currency")]
    pub currency: String,
    /// Local symbol; derived from the other fields when absent.
    #[serde(default)]
    pub local_symbol: Option<String>,
    /// Option right.
    #[serde(default)]
    pub right: Option<OptionRight>,
    /// Option strike.
    #[serde(default)]
    pub strike: Option<Decimal>,
    /// Option expiration.
    #[serde(default)]
    pub expiration: Option<NaiveDate>,
    /// Contract multiplier; 1 for stocks and 100 for options when absent.
    #[serde(default)]
    pub multiplier: Option<Decimal>,
    /// Tick rule table id.
    pub rule_id: i32,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl PaperListing {
    /// Stock listing.
    #[must_use]
    pub fn stock(con_id: i64, symbol: &str, rule_id: i32) -> Self {
        Self {
            con_id,
            symbol: symbol.to_string(),
            currency: default_currency(),
            local_symbol: None,
            right: None,
            strike: None,
            expiration: None,
            multiplier: None,
            rule_id,
        }
    }

    /// Option listing.
    #[must_use]
    pub fn option(
        con_id: i64,
        symbol: &str,
        right: OptionRight,
        strike: Decimal,
        expiration: NaiveDate,
        rule_id: i32,
    ) -> Self {
        Self {
            right: Some(right),
            strike: Some(strike),
            expiration: Some(expiration),
            ..Self::stock(con_id, symbol, rule_id)
        }
    }

    /// Descriptor this listing answers to and the contract it resolves to.
    ///
    /// # Errors
    ///
    /// Returns `Multiplier` if the configured multiplier is zero or negative.
    pub fn resolve(&self, exchange: &str) -> Result<(ContractSpec, Contract), PaperMarketError> {
        if let Some(multiplier) = self.multiplier
            && multiplier <= Decimal::ZERO
        {
            return Err(PaperMarketError::Multiplier {
                con_id: self.con_id,
                multiplier,
            });
        }
        let symbol = Symbol::new(self.symbol.as_str());
        let market_rules = vec![MarketRuleRef {
            exchange: exchange.to_string(),
            rule_id: self.rule_id,
        }];

        let (spec, kind, local_symbol, multiplier) =
            if let (Some(right), Some(strike), Some(expiration)) =
                (self.right, self.strike, self.expiration)
            {
                let local = format!(
                    "{:<6}{}{}{:08}",
                    self.symbol,
                    expiration.format("%y%m%d"),
                    right,
                    (strike * Decimal::ONE_THOUSAND).trunc().to_i64().unwrap_or(0)
                );
                (
                    ContractSpec::Option {
                        symbol: symbol.clone(),
                        currency: self.currency.clone(),
                        exchange: exchange.to_string(),
                        right,
                        strike,
                        expiration,
                    },
                    ContractKind::Option {
                        right,
                        strike,
                        expiration,
                    },
                    local,
                    Decimal::ONE_HUNDRED,
                )
            } else {
                (
                    ContractSpec::stock(symbol.clone(), self.currency.clone(), exchange),
                    ContractKind::Stock,
                    self.symbol.clone(),
                    Decimal::ONE,
                )
            };

        let contract = Contract {
            con_id: self.con_id,
            symbol,
            local_symbol: self.local_symbol.clone().unwrap_or(local_symbol),
            kind,
            currency: self.currency.clone(),
            exchange: exchange.to_string(),
            multiplier: self.multiplier.unwrap_or(multiplier),
            market_rules,
        };
        Ok((spec, contract))
    }
}

/// A tick rule table served by the paper venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperRuleTable {
    /// Rule table id.
    pub id: i32,
    /// Rules, in any order.
    pub rules: Vec<TickRule>,
}

/// A scripted quote change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayStep {
    /// Seconds after the paper clock start at which the step applies.
    pub after_secs: u64,
    /// Local symbol whose quote changes.
    pub local_symbol: String,
    /// New bid; unchanged when absent.
    #[serde(default)]
    pub bid: Option<Decimal>,
    /// New ask; unchanged when absent.
    #[serde(default)]
    pub ask: Option<Decimal>,
    /// New last price; unchanged when absent.
    #[serde(default)]
    pub last: Option<Decimal>,
    /// Most units one match fills from now on; unchanged when absent.
    #[serde(default)]
    pub fill_size: Option<Decimal>,
}

/// Everything the paper venue serves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaperMarket {
    /// Resolvable contracts.
    pub listings: Vec<PaperListing>,
    /// Tick rule tables.
    pub rules: Vec<PaperRuleTable>,
    /// Liquid hours string for every contract.
    pub liquid_hours: Option<String>,
    /// Scripted quote changes, in any order.
    pub steps: Vec<ReplayStep>,
}

impl PaperMarket {
    /// Parse a YAML document.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for invalid YAML, `Rules` for an invalid rule table and
    /// `Multiplier` for a listing with a non-positive multiplier.
    pub fn from_yaml_str(content: &str) -> Result<Self, PaperMarketError> {
        let market: Self = serde_yaml_bw::from_str(content)?;
        market.rule_tables()?;
        for listing in &market.listings {
            listing.resolve("SMART")?;
        }
        Ok(market)
    }

    /// Load a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `Read` if the file cannot be read, otherwise as [`Self::from_yaml_str`].
    pub async fn load(path: &Path) -> Result<Self, PaperMarketError> {
        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| PaperMarketError::Read {
                    path: path.display().to_string(),
                    source,
                })?;
        Self::from_yaml_str(&content)
    }

    /// Validated rule tables keyed by id.
    ///
    /// # Errors
    ///
    /// Returns `Rules` for the first invalid table.
    pub fn rule_tables(&self) -> Result<Vec<(i32, TickRuleTable)>, PaperMarketError> {
        self.rules
            .iter()
            .map(|table| {
                TickRuleTable::new(table.rules.clone())
                    .map(|rules| (table.id, rules))
                    .map_err(|source| PaperMarketError::Rules {
                        id: table.id,
                        source,
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DOCUMENT: &str = r#"
listings:
  - { con_id: 1, symbol: XYZ, rule_id: 26 }
  - { con_id: 2, symbol: XYZ, right: Call, strike: "101", expiration: 2024-03-15, rule_id: 26 }
rules:
  - { id: 26, rules: [{ threshold: "1", increment: "0.05" }, { threshold: "0", increment: "0.01" }] }
liquid_hours: "20240315:0930-20240315:1600"
steps:
  - { after_secs: 5, local_symbol: XYZ, last: "101" }
  - { after_secs: 9, local_symbol: XYZ, fill_size: "3" }
"#;

    #[test]
    fn paper_market_from_yaml() {
        let market = PaperMarket::from_yaml_str(DOCUMENT).unwrap();
        assert_eq!(market.listings.len(), 2);
        assert_eq!(market.steps[0].last, Some(dec!(101)));
        assert_eq!(market.steps[0].bid, None);
        assert_eq!(market.steps[0].fill_size, None);
        assert_eq!(market.steps[1].fill_size, Some(dec!(3)));

        let tables = market.rule_tables().unwrap();
        assert_eq!(tables[0].0, 26);
        assert_eq!(tables[0].1.rules()[0].increment, dec!(0.01));
    }

    #[test]
    fn paper_market_invalid_rules() {
        let result = PaperMarket::from_yaml_str("rules:\n  - { id: 7, rules: [] }\n");
        assert!(matches!(result, Err(PaperMarketError::Rules { id: 7, .. })));
    }

    #[test]
    fn paper_listing_stock() {
        let (spec, contract) = PaperListing::stock(1, "XYZ", 26).resolve("SMART").unwrap();
        assert_eq!(spec, ContractSpec::stock(Symbol::new("XYZ"), "USD", "SMART"));
        assert_eq!(contract.local_symbol, "XYZ");
        assert_eq!(contract.multiplier, dec!(1));
        assert_eq!(contract.rule_id_for("SMART"), Some(26));
        assert!(!contract.is_option());
    }

    #[test]
    fn paper_listing_option() {
        let expiration = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let (spec, contract) =
            PaperListing::option(2, "XYZ", OptionRight::Put, dec!(97.5), expiration, 26)
                .resolve("SMART")
                .unwrap();

        assert_eq!(spec.to_string(), "OPT XYZ 20240315 97.5P@SMART");
        assert_eq!(contract.local_symbol, "XYZ   240315P00097500");
        assert_eq!(contract.multiplier, dec!(100));
        assert!(contract.is_option());
    }

    #[test]
    fn paper_listing_rejects_non_positive_multiplier() {
        for multiplier in [dec!(0), dec!(-100)] {
            let listing = PaperListing {
                multiplier: Some(multiplier),
                ..PaperListing::stock(4, "XYZ", 26)
            };
            let err = listing.resolve("SMART").unwrap_err();
            assert!(matches!(
                err,
                PaperMarketError::Multiplier { con_id: 4, multiplier: m } if m == multiplier
            ));
        }

        let document = "listings:\n  - { con_id: 5, symbol: XYZ, multiplier: \"0\", rule_id: 26 }\n";
        let result = PaperMarket::from_yaml_str(document);
        assert!(matches!(result, Err(PaperMarketError::Multiplier { con_id: 5, .. })));
    }
}
