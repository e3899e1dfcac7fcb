pub mod format;
mod model;

pub use model::{BillData, BillItem, PaymentMode, StoreSettings};

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{BillError, Result};

/// On-disk shape of a bill export request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillFile {
    pub bill: BillData,
    #[serde(default)]
    pub items: Vec<BillItem>,
    /// Overrides the store settings from config.toml when present
    #[serde(default)]
    pub settings: Option<StoreSettings>,
}

/// Load a bill JSON file
pub fn load_bill(path: &Path) -> Result<BillFile> {
    if !path.exists() {
        return Err(BillError::BillFileNotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content).map_err(|e| BillError::BillParse {
        path: path.to_path_buf(),
        source: e,
    })
}

/// File name for a rendered bill. Path separators in the bill number
/// would escape the output directory, so they are replaced.
pub fn output_file_name(bill_number: &str) -> String {
    let safe: String = bill_number
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '-' } else { c })
        .collect();
    format!("{}.pdf", safe)
}

/// Sample bill written by `billpdf init`
pub const SAMPLE_BILL: &str = r#"{
  "bill": {
    "billNumber": "INV-1001",
    "createdAt": "2024-01-15T10:30:00",
    "subtotal": 1000,
    "discountPercent": 10,
    "discountAmount": 100,
    "total": 900,
    "paymentMode": "cash"
  },
  "items": [
    {
      "productName": "Widget",
      "quantity": 2,
      "unitPrice": 450,
      "totalPrice": 900
    }
  ]
}
"#;
