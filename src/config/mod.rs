mod settings;

pub use settings::{
    Config, FormatSettings, Grouping, PdfSettings, DEFAULT_DATE_FORMAT, DEFAULT_TIME_FORMAT,
};

use crate::error::{BillError, Result};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the config directory path (XDG config dir, falling back to ~/.billpdf/)
pub fn config_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "billpdf") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = dirs_home().ok_or_else(|| {
        BillError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".billpdf"))
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

/// Expand ~ in paths
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs_home() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Resolve the configured output directory. Relative paths are taken
/// relative to the config directory.
pub fn resolve_output_dir(output_dir: &str, config_dir: &Path) -> PathBuf {
    let path = expand_path(output_dir);
    if path.is_absolute() {
        path
    } else {
        config_dir.join(path)
    }
}

/// Load the main config.toml
pub fn load_config(config_dir: &Path) -> Result<Config> {
    let path = config_dir.join("config.toml");
    if !path.exists() {
        return Err(BillError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    toml::from_str(&content).map_err(|e| BillError::ConfigParse { path, source: e })
}

/// Path of the bill template inside the config directory
pub fn template_path(config_dir: &Path) -> PathBuf {
    config_dir.join("templates").join("bill.html")
}

/// Load the bill template: an explicit file wins, then the config
/// directory's templates/bill.html, then the built-in template.
pub fn load_template(config_dir: &Path, explicit: Option<&Path>) -> Result<String> {
    if let Some(path) = explicit {
        if !path.exists() {
            return Err(BillError::TemplateNotFound(path.to_path_buf()));
        }
        return Ok(fs::read_to_string(path)?);
    }

    let path = template_path(config_dir);
    if path.exists() {
        return Ok(fs::read_to_string(path)?);
    }
    Ok(BILL_TEMPLATE.to_string())
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[store]
store_name = "Your Store Name"
address_line1 = "12 Market Road"
address_line2 = "Bengaluru 560001"
phone = "+91 98765 43210"
gst_number = "29ABCDE1234F1Z5"

[format]
currency_symbol = "₹"
grouping = "indian"        # or "western" (100,000)
date_format = "%d/%m/%Y"
time_format = "%I:%M %p"

[pdf]
output_dir = "output"      # relative to this directory, or absolute / ~/...
margin_mm = 10.0
compress = true
"#;

/// Built-in bill template
pub const BILL_TEMPLATE: &str = r#"<div class="text-center mb-4">
  <h1 class="text-2xl font-bold">{{storeName}}</h1>
  <p class="text-sm">{{addressLine1}}</p>
  <p class="text-sm">{{addressLine2}}</p>
  <p class="text-sm">Phone: {{phone}}</p>
  <p class="text-sm">GSTIN: {{gstNumber}}</p>
</div>

<div class="flex justify-between border-t border-b py-2 mb-4 text-sm">
  <div>
    <p><strong>Bill No:</strong> {{billNumber}}</p>
    <p><strong>Payment:</strong> {{paymentMode}}</p>
  </div>
  <div class="text-right">
    <p><strong>Date:</strong> {{date}}</p>
    <p><strong>Time:</strong> {{time}}</p>
  </div>
</div>

<table class="w-full text-sm mb-4">
  <thead>
    <tr class="border-b bg-gray-100">
      <th class="text-left py-2" style="width: 8%">#</th>
      <th class="text-left py-2" style="width: 44%">Item</th>
      <th class="text-center py-2" style="width: 12%">Qty</th>
      <th class="text-right py-2" style="width: 18%">Price</th>
      <th class="text-right py-2" style="width: 18%">Total</th>
    </tr>
  </thead>
  <tbody>
    {{items}}
  </tbody>
</table>

<div class="border-t pt-2 text-sm">
  <div class="flex justify-between"><span>Subtotal:</span><span>{{subtotal}}</span></div>
  <div class="flex justify-between"><span>Discount ({{discountPercent}}%):</span><span>-{{discountAmount}}</span></div>
  <div class="flex justify-between text-lg font-bold border-t pt-2 mt-2"><span>Total:</span><span>{{total}}</span></div>
  <div class="flex justify-between text-xs text-gray-600 mt-2"><span>Cash: {{cashAmount}}</span><span>UPI: {{upiAmount}}</span></div>
</div>

<p class="text-center text-xs text-gray-500 mt-6">Thank you for shopping with us!</p>
"#;
