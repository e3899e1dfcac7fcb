pub mod bill;
pub mod config;
pub mod error;
pub mod layout;
pub mod pdf;
pub mod render;
pub mod template;

pub use bill::format::format_currency;
pub use bill::{BillData, BillFile, BillItem, PaymentMode, StoreSettings};
pub use config::{Config, FormatSettings, Grouping};
pub use error::{BillError, Result};
pub use layout::{LayoutSurface, Strip, Surface};
pub use pdf::{paginate, PageSlice};
pub use render::{BillRenderer, RenderSettings, RenderedBill};
pub use template::Template;
