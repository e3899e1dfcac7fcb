use serde::{Deserialize, Serialize};

use crate::bill::StoreSettings;

pub const DEFAULT_DATE_FORMAT: &str = "%d/%m/%Y";
pub const DEFAULT_TIME_FORMAT: &str = "%I:%M %p";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub store: StoreSettings,
    #[serde(default)]
    pub format: FormatSettings,
    #[serde(default)]
    pub pdf: PdfSettings,
}

/// Digit grouping for currency amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// 1,00,000
    #[default]
    Indian,
    /// 100,000
    Western,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FormatSettings {
    pub currency_symbol: String,
    pub grouping: Grouping,
    pub date_format: String,
    pub time_format: String,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            grouping: Grouping::Indian,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PdfSettings {
    pub output_dir: String,
    /// Printable margin on every side of the rendering surface
    pub margin_mm: f32,
    /// Flate-compress content streams
    pub compress: bool,
}

impl Default for PdfSettings {
    fn default() -> Self {
        Self {
            output_dir: "output".to_string(),
            margin_mm: 10.0,
            compress: true,
        }
    }
}
