use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a bill was settled. Tags are matched case-insensitively and
/// `split` is accepted for `mixed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    Cash,
    Upi,
    Mixed,
}

impl PaymentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "cash",
            PaymentMode::Upi => "upi",
            PaymentMode::Mixed => "mixed",
        }
    }
}

impl FromStr for PaymentMode {
    type Err = String;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMode::Cash),
            "upi" => Ok(PaymentMode::Upi),
            "mixed" | "split" => Ok(PaymentMode::Mixed),
            _ => Err(format!(
                "unknown payment mode `{tag}`, expected cash, upi or mixed"
            )),
        }
    }
}

impl<'de> Deserialize<'de> for PaymentMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(de::Error::custom)
    }
}

impl fmt::Display for PaymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A finalized bill as handed over by the POS.
///
/// Totals are taken as given: `total == subtotal - discount_amount` is the
/// caller's responsibility.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillData {
    pub bill_number: String,
    pub created_at: NaiveDateTime,
    pub subtotal: f64,
    #[serde(default)]
    pub discount_percent: f64,
    #[serde(default)]
    pub discount_amount: f64,
    pub total: f64,
    pub payment_mode: PaymentMode,
    #[serde(default)]
    pub cash_amount: Option<f64>,
    #[serde(default)]
    pub upi_amount: Option<f64>,
}

/// A line on the bill
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillItem {
    pub product_name: String,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
    pub unit_price: f64,
    pub total_price: f64,
}

/// Store identity printed in the bill header
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StoreSettings {
    #[serde(alias = "store_name")]
    pub store_name: String,
    #[serde(default, alias = "address_line1")]
    pub address_line1: String,
    #[serde(default, alias = "address_line2")]
    pub address_line2: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, alias = "gst_number")]
    pub gst_number: String,
}
