//! Paginated PDF assembly.
//!
//! The strip is written once as a Form XObject. Every page draws that same
//! XObject shifted up by the page's offset, so page `i` shows the band
//! `[i * P, (i + 1) * P)` of the strip and the media box clips the rest.

use chrono::NaiveDateTime;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, Stream, StringFormat};

use crate::error::RenderError;
use crate::layout::metrics::encode_winansi;
use crate::layout::paint::{Color, PaintCommand};
use crate::layout::Strip;

const STRIP_NAME: &[u8] = b"Strip";
const REGULAR_FONT: &[u8] = b"F1";
const BOLD_FONT: &[u8] = b"F2";

// Heights within this distance of a page boundary do not start a new page
const PAGE_EPSILON: f32 = 1e-3;

/// One page of output: which band of the strip it shows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSlice {
    pub index: usize,
    /// Top of the visible band, in strip coordinates
    pub offset: f32,
}

/// Split a strip of `strip_height` into page bands of `page_height`.
///
/// Always yields at least one page; otherwise `ceil(strip_height / page_height)`.
/// Content that straddles a boundary is split across the two pages.
pub fn paginate(strip_height: f32, page_height: f32) -> Vec<PageSlice> {
    let count = if page_height <= 0.0 {
        1
    } else {
        (((strip_height - PAGE_EPSILON) / page_height).ceil() as usize).max(1)
    };

    (0..count)
        .map(|index| PageSlice {
            index,
            offset: index as f32 * page_height,
        })
        .collect()
}

/// Document-level metadata and encoding options
#[derive(Debug, Clone)]
pub struct DocumentOptions {
    pub title: String,
    pub created_at: NaiveDateTime,
    pub page_height: f32,
    pub compress: bool,
}

/// Assemble the paginated document and serialize it
pub fn build_document(
    strip: &Strip,
    slices: &[PageSlice],
    options: &DocumentOptions,
) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));

    let strip_content = strip_content(strip)?;
    let strip_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), real(strip.width), real(strip.height)],
            "Resources" => dictionary! {
                "Font" => dictionary! {
                    "F1" => regular_id,
                    "F2" => bold_id,
                },
            },
        },
        strip_content,
    ));

    let mut page_ids = Vec::with_capacity(slices.len());
    for slice in slices {
        // strip bottom sits at y = 0 of the XObject; lift it so the band's
        // top lands on the page's top edge
        let shift = options.page_height + slice.offset - strip.height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![1.into(), 0.into(), 0.into(), 1.into(), 0.into(), real(shift)],
                ),
                Operation::new("Do", vec![Object::Name(STRIP_NAME.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(strip.width), real(options.page_height)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    "Strip" => strip_id,
                },
            },
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
            "Count" => page_ids.len() as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(encode_winansi(&options.title), StringFormat::Literal),
        "Producer" => Object::string_literal("billpdf"),
        "CreationDate" => Object::string_literal(pdf_date(&options.created_at)),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    if options.compress {
        doc.compress();
    }

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| RenderError::Write(e.to_string()))?;
    Ok(buffer)
}

fn font(base: &str) -> Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

// Two decimals keep content streams small and stable
fn real(value: f32) -> Object {
    Object::Real((value * 100.0).round() / 100.0)
}

fn rgb(op: &str, color: Color) -> Operation {
    let [r, g, b] = color.components();
    Operation::new(op, vec![real(r), real(g), real(b)])
}

fn pdf_date(at: &NaiveDateTime) -> String {
    at.format("D:%Y%m%d%H%M%S").to_string()
}

/// Content stream for the whole strip. Strip coordinates grow downwards,
/// PDF coordinates upwards.
fn strip_content(strip: &Strip) -> Result<Vec<u8>, RenderError> {
    let flip = |y: f32| strip.height - y;
    let mut ops = Vec::new();

    for command in &strip.commands {
        match command {
            PaintCommand::FillRect {
                x,
                y,
                width,
                height,
                color,
            } => {
                ops.push(rgb("rg", *color));
                ops.push(Operation::new(
                    "re",
                    vec![real(*x), real(flip(*y + *height)), real(*width), real(*height)],
                ));
                ops.push(Operation::new("f", vec![]));
            }
            PaintCommand::Line {
                x1,
                y1,
                x2,
                y2,
                width,
                color,
            } => {
                ops.push(rgb("RG", *color));
                ops.push(Operation::new("w", vec![real(*width)]));
                ops.push(Operation::new("m", vec![real(*x1), real(flip(*y1))]));
                ops.push(Operation::new("l", vec![real(*x2), real(flip(*y2))]));
                ops.push(Operation::new("S", vec![]));
            }
            PaintCommand::Text {
                x,
                baseline,
                size,
                bold,
                color,
                text,
            } => {
                let font = if *bold { BOLD_FONT } else { REGULAR_FONT };
                ops.push(Operation::new("BT", vec![]));
                ops.push(Operation::new(
                    "Tf",
                    vec![Object::Name(font.to_vec()), real(*size)],
                ));
                ops.push(rgb("rg", *color));
                ops.push(Operation::new("Td", vec![real(*x), real(flip(*baseline))]));
                ops.push(Operation::new(
                    "Tj",
                    vec![Object::String(encode_winansi(text), StringFormat::Literal)],
                ));
                ops.push(Operation::new("ET", vec![]));
            }
        }
    }

    Ok(Content { operations: ops }.encode()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutSurface, Surface, A4_HEIGHT};
    use chrono::NaiveDate;

    fn options(compress: bool) -> DocumentOptions {
        DocumentOptions {
            title: "INV-1001".to_string(),
            created_at: NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap(),
            page_height: A4_HEIGHT,
            compress,
        }
    }

    #[test]
    fn test_paginate_counts() {
        let p = 100.0;
        assert_eq!(paginate(0.0, p).len(), 1);
        assert_eq!(paginate(40.0, p).len(), 1);
        assert_eq!(paginate(100.0, p).len(), 1);
        assert_eq!(paginate(100.5, p).len(), 2);
        assert_eq!(paginate(250.0, p).len(), 3);
        assert_eq!(paginate(300.0, p).len(), 3);
    }

    #[test]
    fn test_paginate_bands_are_contiguous() {
        let p = A4_HEIGHT;
        let h = p * 3.4;
        let slices = paginate(h, p);
        assert_eq!(slices.len(), (h / p).ceil() as usize);
        assert_eq!(slices[0].offset, 0.0);
        for pair in slices.windows(2) {
            assert_eq!(pair[1].index, pair[0].index + 1);
            assert!((pair[1].offset - (pair[0].offset + p)).abs() < 1e-3);
        }
        let last = slices.last().unwrap();
        assert!(last.offset < h && last.offset + p >= h);
    }

    #[test]
    fn test_document_page_count_matches_slices() {
        let rows = "<p>row</p>".repeat(200);
        let strip = LayoutSurface::default().rasterize(&rows).unwrap();
        let slices = paginate(strip.height, A4_HEIGHT);
        assert!(slices.len() > 1);

        let bytes = build_document(&strip, &slices, &options(true)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), slices.len());
    }

    #[test]
    fn test_each_page_shows_its_band() {
        let rows = "<p>row</p>".repeat(200);
        let strip = LayoutSurface::default().rasterize(&rows).unwrap();
        let slices = paginate(strip.height, A4_HEIGHT);
        assert!(slices.len() > 2);

        let bytes = build_document(&strip, &slices, &options(false)).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        // get_pages is keyed by page number, so iteration is in page order
        let shifts: Vec<f32> = doc
            .get_pages()
            .values()
            .map(|page_id| {
                let raw = doc.get_page_content(*page_id).unwrap();
                let content = Content::decode(&raw).unwrap();
                let cm = content
                    .operations
                    .iter()
                    .find(|op| op.operator == "cm")
                    .expect("page places the strip with cm");
                cm.operands[5].as_float().unwrap()
            })
            .collect();
        assert_eq!(shifts.len(), slices.len());

        // the band top (strip y = i * P) must land on the page's top edge
        for (i, shift) in shifts.iter().enumerate() {
            let expected = A4_HEIGHT - strip.height + i as f32 * A4_HEIGHT;
            assert!(
                (shift - expected).abs() < 0.02,
                "page {i}: shift {shift}, expected {expected}"
            );
        }
        for pair in shifts.windows(2) {
            assert!((pair[1] - pair[0] - A4_HEIGHT).abs() < 0.02);
        }
    }

    #[test]
    fn test_uncompressed_strip_contains_encoded_text() {
        let strip = LayoutSurface::default()
            .rasterize("<p>Widget</p><p>₹900</p>")
            .unwrap();
        let slices = paginate(strip.height, A4_HEIGHT);
        let bytes = build_document(&strip, &slices, &options(false)).unwrap();
        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.contains("(Widget) Tj"));
        assert!(raw.contains("(Rs.900) Tj"));
        assert!(raw.contains("/Helvetica-Bold"));
        assert!(raw.contains("D:20240115103000"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let strip = LayoutSurface::default().rasterize("<h1>Acme</h1>").unwrap();
        let slices = paginate(strip.height, A4_HEIGHT);
        let a = build_document(&strip, &slices, &options(true)).unwrap();
        let b = build_document(&strip, &slices, &options(true)).unwrap();
        assert_eq!(a, b);
    }
}
