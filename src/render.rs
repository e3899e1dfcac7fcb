use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

use crate::bill::{output_file_name, BillData, BillItem, StoreSettings};
use crate::config::{Config, FormatSettings};
use crate::error::{BillError, RenderError, Result};
use crate::layout::{LayoutSurface, Surface, A4_HEIGHT};
use crate::pdf::{build_document, paginate, DocumentOptions, PageSlice};
use crate::template::{BillContext, Template};

/// Settings that shape a render, independent of the bill itself
#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub format: FormatSettings,
    pub margin_mm: f32,
    pub compress: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            format: FormatSettings::default(),
            margin_mm: 10.0,
            compress: true,
        }
    }
}

impl From<&Config> for RenderSettings {
    fn from(config: &Config) -> Self {
        Self {
            format: config.format.clone(),
            margin_mm: config.pdf.margin_mm,
            compress: config.pdf.compress,
        }
    }
}

/// A finished document, not yet written anywhere
#[derive(Debug, Clone)]
pub struct RenderedBill {
    pub bytes: Vec<u8>,
    /// The band of the strip each page shows, in page order
    pub pages: Vec<PageSlice>,
    pub strip_height: f32,
}

impl RenderedBill {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Renders bills through a template onto paginated A4 PDFs.
///
/// Holds no per-render state: every call mounts its own surface.
pub struct BillRenderer<S = LayoutSurface> {
    surface: S,
    settings: RenderSettings,
}

impl BillRenderer<LayoutSurface> {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            surface: LayoutSurface::new(settings.margin_mm),
            settings,
        }
    }
}

impl<S: Surface> BillRenderer<S> {
    pub fn with_surface(surface: S, settings: RenderSettings) -> Self {
        Self { surface, settings }
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// Substitute the template for this bill
    pub fn markup(
        &self,
        template: &Template,
        bill: &BillData,
        items: &[BillItem],
        store: &StoreSettings,
    ) -> String {
        let ctx = BillContext {
            bill,
            items,
            store,
            format: &self.settings.format,
        };
        template.render(&ctx)
    }

    /// Render to PDF bytes.
    ///
    /// Any failure inside the pipeline is logged and reported as
    /// [`BillError::GenerationFailed`].
    pub fn render_bytes(
        &self,
        template: &Template,
        bill: &BillData,
        items: &[BillItem],
        store: &StoreSettings,
    ) -> Result<RenderedBill> {
        self.try_render(template, bill, items, store).map_err(|e| {
            error!(bill = %bill.bill_number, error = %e, "PDF generation failed");
            BillError::GenerationFailed
        })
    }

    /// Render and write to `path`. Nothing is written unless rendering
    /// succeeded; write errors are returned as they are.
    pub fn render_to_path(
        &self,
        template: &Template,
        bill: &BillData,
        items: &[BillItem],
        store: &StoreSettings,
        path: &Path,
    ) -> Result<RenderedBill> {
        let rendered = self.render_bytes(template, bill, items, store)?;
        save(bill, &rendered, path)?;
        Ok(rendered)
    }

    /// Render into `dir` as `<billNumber>.pdf`, creating `dir` once the
    /// document is built
    pub fn render_to_dir(
        &self,
        template: &Template,
        bill: &BillData,
        items: &[BillItem],
        store: &StoreSettings,
        dir: &Path,
    ) -> Result<(PathBuf, RenderedBill)> {
        let rendered = self.render_bytes(template, bill, items, store)?;
        fs::create_dir_all(dir)?;
        let path = dir.join(output_file_name(&bill.bill_number));
        save(bill, &rendered, &path)?;
        Ok((path, rendered))
    }

    fn try_render(
        &self,
        template: &Template,
        bill: &BillData,
        items: &[BillItem],
        store: &StoreSettings,
    ) -> std::result::Result<RenderedBill, RenderError> {
        let markup = self.markup(template, bill, items, store);
        debug!(bill = %bill.bill_number, items = items.len(), bytes = markup.len(), "template substituted");

        let strip = self.surface.rasterize(&markup)?;
        let slices = paginate(strip.height, A4_HEIGHT);
        debug!(height = strip.height, pages = slices.len(), "strip paginated");

        let options = DocumentOptions {
            title: bill.bill_number.clone(),
            created_at: bill.created_at,
            page_height: A4_HEIGHT,
            compress: self.settings.compress,
        };
        let bytes = build_document(&strip, &slices, &options)?;

        Ok(RenderedBill {
            bytes,
            pages: slices,
            strip_height: strip.height,
        })
    }
}

fn save(bill: &BillData, rendered: &RenderedBill, path: &Path) -> Result<()> {
    fs::write(path, &rendered.bytes)?;
    info!(
        bill = %bill.bill_number,
        pages = rendered.page_count(),
        path = %path.display(),
        "bill written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bill::PaymentMode;
    use crate::config::BILL_TEMPLATE;
    use crate::layout::Strip;
    use chrono::NaiveDate;

    struct BrokenSurface;

    impl Surface for BrokenSurface {
        fn rasterize(&self, _markup: &str) -> std::result::Result<Strip, RenderError> {
            Err(RenderError::Surface("no graphics context".to_string()))
        }
    }

    fn bill() -> BillData {
        BillData {
            bill_number: "INV-1001".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            subtotal: 1000.0,
            discount_percent: 10.0,
            discount_amount: 100.0,
            total: 900.0,
            payment_mode: PaymentMode::Cash,
            cash_amount: None,
            upi_amount: None,
        }
    }

    #[test]
    fn test_surface_failure_is_generic() {
        let renderer = BillRenderer::with_surface(BrokenSurface, RenderSettings::default());
        let template = Template::parse(BILL_TEMPLATE);
        let err = renderer
            .render_bytes(&template, &bill(), &[], &StoreSettings::default())
            .unwrap_err();
        assert!(matches!(err, BillError::GenerationFailed));
        assert_eq!(err.to_string(), "PDF generation failed");
    }

    #[test]
    fn test_empty_items_single_page() {
        let renderer = BillRenderer::new(RenderSettings::default());
        let template = Template::parse(BILL_TEMPLATE);
        let rendered = renderer
            .render_bytes(&template, &bill(), &[], &StoreSettings::default())
            .unwrap();
        assert_eq!(rendered.page_count(), 1);
        assert_eq!(rendered.pages[0].offset, 0.0);
        assert!(rendered.bytes.starts_with(b"%PDF-1.5"));
    }

    #[test]
    fn test_settings_from_config() {
        let config: Config = toml::from_str(
            "[store]\nstore_name = \"A\"\n[pdf]\nmargin_mm = 5.0\ncompress = false\n[format]\ncurrency_symbol = \"$\"\n",
        )
        .unwrap();
        let settings = RenderSettings::from(&config);
        assert_eq!(settings.margin_mm, 5.0);
        assert!(!settings.compress);
        assert_eq!(settings.format.currency_symbol, "$");
    }
}
