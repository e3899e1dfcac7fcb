//! The rendering surface.
//!
//! Markup is parsed with `scraper`, styled with the baseline style sheet
//! in [`style`], and laid out top to bottom onto a single [`Strip`] one
//! page wide. The strip is what later gets sliced into pages.

pub mod metrics;
pub mod paint;
pub mod style;

use scraper::{ElementRef, Html, Node};

use crate::error::RenderError;
use metrics::text_width;
use paint::{Color, PaintCommand};
use style::{Align, Display, Style};

/// Millimetres to points
pub const MM: f32 = 72.0 / 25.4;
pub const A4_WIDTH: f32 = 210.0 * MM;
pub const A4_HEIGHT: f32 = 297.0 * MM;

const LINE_HEIGHT: f32 = 1.3;
const ASCENT: f32 = 0.8;
const RULE_WIDTH: f32 = 0.75;

/// Everything painted for one document, top-down, in points
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    pub width: f32,
    pub height: f32,
    pub commands: Vec<PaintCommand>,
}

impl Strip {
    /// Text runs in paint order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(PaintCommand::text)
    }
}

/// Something that turns populated markup into a painted strip
pub trait Surface {
    fn rasterize(&self, markup: &str) -> Result<Strip, RenderError>;
}

/// The built-in surface: an A4-wide page with a uniform printable margin
#[derive(Debug, Clone)]
pub struct LayoutSurface {
    width: f32,
    margin: f32,
}

impl LayoutSurface {
    pub fn new(margin_mm: f32) -> Self {
        Self {
            width: A4_WIDTH,
            margin: margin_mm * MM,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }
}

impl Default for LayoutSurface {
    fn default() -> Self {
        Self::new(10.0)
    }
}

impl Surface for LayoutSurface {
    fn rasterize(&self, markup: &str) -> Result<Strip, RenderError> {
        let content_width = self.content_width();
        if self.margin < 0.0 || content_width <= 0.0 {
            return Err(RenderError::NoContentWidth(self.width));
        }

        let document = Html::parse_fragment(markup);
        let mut canvas = Canvas::default();
        let bottom = canvas.flow(
            document.root_element(),
            &Style::root(),
            self.margin,
            content_width,
            self.margin,
        );

        if canvas.commands.is_empty() {
            return Err(RenderError::EmptySurface);
        }

        let height = bottom + self.margin;
        let mut commands = Vec::with_capacity(canvas.commands.len() + 1);
        commands.push(PaintCommand::FillRect {
            x: 0.0,
            y: 0.0,
            width: self.width,
            height,
            color: Color::WHITE,
        });
        commands.extend(canvas.commands);

        tracing::debug!(height, commands = commands.len(), "surface rasterized");

        Ok(Strip {
            width: self.width,
            height,
            commands,
        })
    }
}

#[derive(Debug, Clone)]
struct Run {
    text: String,
    size: f32,
    bold: bool,
    color: Color,
}

#[derive(Debug, Clone)]
enum Inline {
    Run(Run),
    Break,
}

#[derive(Debug)]
struct Fragment {
    text: String,
    x: f32,
    size: f32,
    bold: bool,
    color: Color,
}

#[derive(Debug, Default)]
struct Line {
    fragments: Vec<Fragment>,
    width: f32,
    size: f32,
}

/// Greedy word wrapping over styled runs
struct LineBreaker {
    width: f32,
    lines: Vec<Line>,
    current: Line,
}

impl LineBreaker {
    fn new(width: f32) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: Line::default(),
        }
    }

    fn push_word(&mut self, word: &str, space_before: bool, run: &Run) {
        let word_width = text_width(word, run.size, run.bold);
        if word_width > self.width && word.chars().nth(1).is_some() {
            for (i, piece) in split_to_width(word, self.width, run).into_iter().enumerate() {
                self.push_word(piece, space_before && i == 0, run);
            }
            return;
        }
        let mut space = if space_before && !self.current.fragments.is_empty() {
            text_width(" ", run.size, run.bold)
        } else {
            0.0
        };

        if !self.current.fragments.is_empty() && self.current.width + space + word_width > self.width
        {
            self.break_line();
            space = 0.0;
        }

        let line = &mut self.current;
        let same_style = matches!(
            line.fragments.last(),
            Some(last) if last.bold == run.bold && last.size == run.size && last.color == run.color
        );
        match line.fragments.last_mut() {
            Some(last) if same_style => {
                if space > 0.0 {
                    last.text.push(' ');
                }
                last.text.push_str(word);
            }
            _ => {
                let x = line.width + space;
                line.fragments.push(Fragment {
                    text: word.to_string(),
                    x,
                    size: run.size,
                    bold: run.bold,
                    color: run.color,
                });
            }
        }
        line.width += space + word_width;
        line.size = line.size.max(run.size);
    }

    fn break_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push(line);
    }

    fn finish(mut self) -> Vec<Line> {
        if !self.current.fragments.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

/// Cut a word too wide for any line into pieces that each fit, keeping
/// at least one character per piece
fn split_to_width<'a>(word: &'a str, width: f32, run: &Run) -> Vec<&'a str> {
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, ch) in word.char_indices() {
        let end = i + ch.len_utf8();
        if i > start && text_width(&word[start..end], run.size, run.bold) > width {
            pieces.push(&word[start..i]);
            start = i;
        }
    }
    if start < word.len() {
        pieces.push(&word[start..]);
    }
    pieces
}

/// One mounted document being painted. Dropped when rasterization ends.
#[derive(Debug, Default)]
struct Canvas {
    commands: Vec<PaintCommand>,
}

impl Canvas {
    /// Lay out the children of `el` as normal flow; returns the new cursor
    fn flow(&mut self, el: ElementRef<'_>, style: &Style, x: f32, width: f32, mut y: f32) -> f32 {
        let mut inline = Vec::new();

        for child in el.children() {
            match child.value() {
                Node::Text(text) => inline.push(Inline::Run(run(&**text, style))),
                Node::Element(element) => {
                    let Some(child_el) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let child_style = style.compute(element);
                    match child_style.display {
                        Display::None => {}
                        Display::Break => inline.push(Inline::Break),
                        Display::Inline => collect_inline(child_el, &child_style, &mut inline),
                        Display::Block | Display::Flex | Display::Table => {
                            y = self.paragraph(&inline, style, x, width, y);
                            inline.clear();
                            y = self.block(child_el, &child_style, x, width, y);
                        }
                    }
                }
                _ => {}
            }
        }

        self.paragraph(&inline, style, x, width, y)
    }

    fn block(&mut self, el: ElementRef<'_>, style: &Style, x: f32, width: f32, y: f32) -> f32 {
        let top = y + style.margin_top;
        let background_at = self.commands.len();
        let inner_x = x + style.padding_x;
        let inner_width = (width - 2.0 * style.padding_x).max(0.0);
        let content_top = top + style.padding_top;

        let content_bottom = match style.display {
            Display::Flex => self.flex(el, style, inner_x, inner_width, content_top),
            Display::Table => self.table(el, style, inner_x, inner_width, content_top),
            _ => self.flow(el, style, inner_x, inner_width, content_top),
        };

        let bottom = content_bottom + style.padding_bottom;
        self.decorate(style, x, width, top, bottom, background_at);
        bottom + style.margin_bottom
    }

    /// Children side by side in equal columns
    fn flex(&mut self, el: ElementRef<'_>, style: &Style, x: f32, width: f32, y: f32) -> f32 {
        let items: Vec<(ElementRef<'_>, Style)> = el
            .children()
            .filter_map(ElementRef::wrap)
            .map(|child| (child, style.compute(child.value())))
            .filter(|(_, s)| s.display != Display::None)
            .collect();

        if items.is_empty() {
            return y;
        }

        let count = items.len();
        let column = width / count as f32;
        let mut bottom = y;

        for (i, (child, mut child_style)) in items.into_iter().enumerate() {
            if matches!(child_style.display, Display::Inline | Display::Break) {
                child_style.display = Display::Block;
            }
            if style.justify_between && count > 1 && !child_style.align_explicit {
                child_style.align = if i == 0 {
                    Align::Left
                } else if i == count - 1 {
                    Align::Right
                } else {
                    Align::Center
                };
            }
            let item_bottom = self.block(child, &child_style, x + column * i as f32, column, y);
            bottom = bottom.max(item_bottom);
        }

        bottom
    }

    fn table(&mut self, el: ElementRef<'_>, style: &Style, x: f32, width: f32, y: f32) -> f32 {
        let rows = table_rows(el, style);
        let columns = rows
            .iter()
            .map(|row| row.cells.iter().map(|c| c.colspan).sum::<usize>())
            .max()
            .unwrap_or(0);
        if columns == 0 {
            return y;
        }

        let widths = column_widths(&rows, columns, width);
        let mut y = y;

        for row in rows {
            let row_top = y;
            let background_at = self.commands.len();
            let cell_top = row_top + row.style.padding_top;
            let mut bottom = cell_top;
            let mut col = 0;

            for cell in row.cells {
                if col >= columns {
                    break;
                }
                let span = cell.colspan.min(columns - col);
                let cell_x = x + widths[..col].iter().sum::<f32>();
                let cell_width = widths[col..col + span].iter().sum::<f32>();
                bottom = bottom.max(self.block(cell.element, &cell.style, cell_x, cell_width, cell_top));
                col += span;
            }

            let row_bottom = bottom + row.style.padding_bottom;
            self.decorate(&row.style, x, width, row_top, row_bottom, background_at);
            y = row_bottom;
        }

        y
    }

    /// Lay out collected inline content as wrapped lines
    fn paragraph(&mut self, items: &[Inline], style: &Style, x: f32, width: f32, y: f32) -> f32 {
        let has_words = items.iter().any(|item| match item {
            Inline::Run(run) => !run.text.trim().is_empty(),
            Inline::Break => false,
        });
        if !has_words {
            return y;
        }

        let mut breaker = LineBreaker::new(width);
        let mut pending_space = false;

        for item in items {
            match item {
                Inline::Break => {
                    breaker.break_line();
                    pending_space = false;
                }
                Inline::Run(run) => {
                    pending_space |= run.text.starts_with(char::is_whitespace);
                    for (i, word) in run.text.split_whitespace().enumerate() {
                        breaker.push_word(word, pending_space || i > 0, run);
                        pending_space = false;
                    }
                    if run.text.ends_with(char::is_whitespace) {
                        pending_space = true;
                    }
                }
            }
        }

        let mut y = y;
        for line in breaker.finish() {
            let size = if line.size > 0.0 { line.size } else { style.font_size };
            let height = size * LINE_HEIGHT;
            let offset = match style.align {
                Align::Left => 0.0,
                Align::Center => (width - line.width) / 2.0,
                Align::Right => width - line.width,
            }
            .max(0.0);
            let baseline = y + (height - size) / 2.0 + size * ASCENT;

            for fragment in line.fragments {
                self.commands.push(PaintCommand::Text {
                    x: x + offset + fragment.x,
                    baseline,
                    size: fragment.size,
                    bold: fragment.bold,
                    color: fragment.color,
                    text: fragment.text,
                });
            }
            y += height;
        }

        y
    }

    /// Background and borders of a laid-out box
    fn decorate(&mut self, style: &Style, x: f32, width: f32, top: f32, bottom: f32, background_at: usize) {
        if let Some(color) = style.background {
            if bottom > top {
                self.commands.insert(
                    background_at,
                    PaintCommand::FillRect {
                        x,
                        y: top,
                        width,
                        height: bottom - top,
                        color,
                    },
                );
            }
        }
        if style.border_top {
            self.rule(x, width, top);
        }
        if style.border_bottom {
            self.rule(x, width, bottom);
        }
    }

    fn rule(&mut self, x: f32, width: f32, y: f32) {
        self.commands.push(PaintCommand::Line {
            x1: x,
            y1: y,
            x2: x + width,
            y2: y,
            width: RULE_WIDTH,
            color: Color::BORDER,
        });
    }
}

fn run(text: &str, style: &Style) -> Run {
    Run {
        text: text.to_string(),
        size: style.font_size,
        bold: style.bold,
        color: style.color,
    }
}

/// Flatten an inline element (and anything nested in it) into runs
fn collect_inline(el: ElementRef<'_>, style: &Style, out: &mut Vec<Inline>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push(Inline::Run(run(&**text, style))),
            Node::Element(element) => {
                let Some(child_el) = ElementRef::wrap(child) else {
                    continue;
                };
                let child_style = style.compute(element);
                match child_style.display {
                    Display::None => {}
                    Display::Break => out.push(Inline::Break),
                    _ => collect_inline(child_el, &child_style, out),
                }
            }
            _ => {}
        }
    }
}

struct TableCell<'a> {
    element: ElementRef<'a>,
    style: Style,
    colspan: usize,
}

struct TableRow<'a> {
    style: Style,
    cells: Vec<TableCell<'a>>,
}

fn table_rows<'a>(table: ElementRef<'a>, style: &Style) -> Vec<TableRow<'a>> {
    let mut rows = Vec::new();

    for child in table.children().filter_map(ElementRef::wrap) {
        let child_style = style.compute(child.value());
        match child.value().name() {
            "tr" => rows.push(table_row(child, child_style)),
            "thead" | "tbody" | "tfoot" => {
                for tr in child.children().filter_map(ElementRef::wrap) {
                    if tr.value().name() == "tr" {
                        let row_style = child_style.compute(tr.value());
                        rows.push(table_row(tr, row_style));
                    }
                }
            }
            _ => {}
        }
    }

    rows
}

fn table_row(tr: ElementRef<'_>, style: Style) -> TableRow<'_> {
    let cells = tr
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|cell| matches!(cell.value().name(), "td" | "th"))
        .map(|cell| {
            let colspan = cell
                .value()
                .attr("colspan")
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(1)
                .max(1);
            let mut cell_style = style.compute(cell.value());
            if cell_style.display != Display::Table {
                cell_style.display = Display::Block;
            }
            TableCell {
                element: cell,
                style: cell_style,
                colspan,
            }
        })
        .collect();

    TableRow { style, cells }
}

/// Column widths from the first row's `width: N%` cells; the rest share
/// what is left. Percentages are normalized to the table width.
fn column_widths(rows: &[TableRow<'_>], columns: usize, width: f32) -> Vec<f32> {
    let mut pct: Vec<Option<f32>> = vec![None; columns];

    if let Some(first) = rows.iter().find(|r| !r.cells.is_empty()) {
        let mut col = 0;
        for cell in &first.cells {
            if col >= columns {
                break;
            }
            let span = cell.colspan.min(columns - col);
            if let Some(p) = cell.style.width_pct {
                for slot in &mut pct[col..col + span] {
                    *slot = Some(p / span as f32);
                }
            }
            col += span;
        }
    }

    let fixed: f32 = pct.iter().flatten().sum();
    let free = pct.iter().filter(|p| p.is_none()).count();
    let share = if free > 0 {
        (100.0 - fixed).max(0.0) / free as f32
    } else {
        0.0
    };
    let total = fixed + share * free as f32;

    if total <= 0.0 {
        return vec![width / columns as f32; columns];
    }
    pct.iter()
        .map(|p| p.unwrap_or(share) / total * width)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(strip: &Strip) -> Vec<&str> {
        strip.texts().collect()
    }

    fn find(strip: &Strip, needle: &str) -> (f32, f32, f32, bool) {
        strip
            .commands
            .iter()
            .find_map(|c| match c {
                PaintCommand::Text {
                    x,
                    baseline,
                    size,
                    bold,
                    text,
                    ..
                } if text == needle => Some((*x, *baseline, *size, *bold)),
                _ => None,
            })
            .unwrap_or_else(|| panic!("no text {needle:?} in {:?}", texts(strip)))
    }

    #[test]
    fn test_paragraphs_stack_vertically() {
        let strip = LayoutSurface::default()
            .rasterize("<h1>Acme Store</h1><p>12 Market Road</p>")
            .unwrap();
        assert_eq!(texts(&strip), vec!["Acme Store", "12 Market Road"]);

        let (x, heading_baseline, size, bold) = find(&strip, "Acme Store");
        assert!((x - 10.0 * MM).abs() < 0.01);
        assert_eq!(size, 18.0);
        assert!(bold);
        let (_, para_baseline, _, _) = find(&strip, "12 Market Road");
        assert!(para_baseline > heading_baseline);
        assert!(strip.height > para_baseline);
    }

    #[test]
    fn test_opaque_background_first() {
        let strip = LayoutSurface::default().rasterize("<p>x</p>").unwrap();
        assert_eq!(
            strip.commands[0],
            PaintCommand::FillRect {
                x: 0.0,
                y: 0.0,
                width: A4_WIDTH,
                height: strip.height,
                color: Color::WHITE,
            }
        );
    }

    #[test]
    fn test_inline_runs_merge_and_split_by_weight() {
        let strip = LayoutSurface::default()
            .rasterize("<p><strong>Bill No:</strong> INV-1001   today</p>")
            .unwrap();
        assert_eq!(texts(&strip), vec!["Bill No:", "INV-1001 today"]);
        let (label_x, label_baseline, _, label_bold) = find(&strip, "Bill No:");
        let (value_x, value_baseline, _, value_bold) = find(&strip, "INV-1001 today");
        assert!(label_bold && !value_bold);
        assert_eq!(label_baseline, value_baseline);
        assert!(value_x > label_x + text_width("Bill No:", 12.0, true));
    }

    #[test]
    fn test_center_and_right_alignment() {
        let surface = LayoutSurface::default();
        let strip = surface
            .rasterize(r#"<p class="text-center">Mid</p><p class="text-right">End</p>"#)
            .unwrap();
        let left = 10.0 * MM;
        let right = left + surface.content_width();

        let (mid_x, ..) = find(&strip, "Mid");
        let mid_width = text_width("Mid", 12.0, false);
        assert!((mid_x + mid_width / 2.0 - (left + right) / 2.0).abs() < 0.01);

        let (end_x, ..) = find(&strip, "End");
        assert!((end_x + text_width("End", 12.0, false) - right).abs() < 0.01);
    }

    #[test]
    fn test_flex_justify_between() {
        let surface = LayoutSurface::default();
        let strip = surface
            .rasterize(r#"<div class="flex justify-between"><span>Subtotal:</span><span>₹1,000</span></div>"#)
            .unwrap();
        let (label_x, label_baseline, ..) = find(&strip, "Subtotal:");
        let (value_x, value_baseline, ..) = find(&strip, "₹1,000");
        let right = 10.0 * MM + surface.content_width();

        assert!((label_x - 10.0 * MM).abs() < 0.01);
        assert!((value_x + text_width("₹1,000", 12.0, false) - right).abs() < 0.01);
        assert_eq!(label_baseline, value_baseline);
    }

    #[test]
    fn test_table_rows_in_order_with_widths() {
        let markup = r#"<table>
            <tr><th style="width: 10%">#</th><th style="width: 60%">Item</th><th>Total</th></tr>
            <tr class="border-b"><td>1</td><td>Widget</td><td class="text-right font-semibold">₹900</td></tr>
            <tr class="border-b"><td>2</td><td>Gadget</td><td class="text-right font-semibold">₹50</td></tr>
        </table>"#;
        let strip = LayoutSurface::default().rasterize(markup).unwrap();

        let (_, widget_y, ..) = find(&strip, "Widget");
        let (_, gadget_y, ..) = find(&strip, "Gadget");
        assert!(gadget_y > widget_y);

        let (one_x, one_y, ..) = find(&strip, "1");
        let (widget_x, ..) = find(&strip, "Widget");
        assert_eq!(one_y, widget_y);
        let content = LayoutSurface::default().content_width();
        // second column starts 10% in, plus cell padding
        assert!((widget_x - one_x - content * 0.10).abs() < 0.01);

        let (_, _, _, total_bold) = find(&strip, "₹900");
        assert!(total_bold);

        let rules = strip
            .commands
            .iter()
            .filter(|c| matches!(c, PaintCommand::Line { .. }))
            .count();
        assert_eq!(rules, 2);
    }

    #[test]
    fn test_long_text_wraps() {
        let words = "lorem ipsum ".repeat(60);
        let strip = LayoutSurface::default()
            .rasterize(&format!("<p>{words}</p>"))
            .unwrap();
        let lines = texts(&strip).len();
        assert!(lines > 1, "expected wrapping, got {lines} line(s)");

        let surface = LayoutSurface::default();
        for command in &strip.commands {
            if let PaintCommand::Text { x, size, text, .. } = command {
                assert!(x + text_width(text, *size, false) <= 10.0 * MM + surface.content_width() + 0.01);
            }
        }
    }

    #[test]
    fn test_br_and_hidden_elements() {
        let strip = LayoutSurface::default()
            .rasterize(r#"<p>one<br>two</p><script>ignored()</script><div class="hidden">gone</div>"#)
            .unwrap();
        assert_eq!(texts(&strip), vec!["one", "two"]);
        let (_, one_y, ..) = find(&strip, "one");
        let (_, two_y, ..) = find(&strip, "two");
        assert!(two_y > one_y);
    }

    #[test]
    fn test_empty_markup_fails() {
        let surface = LayoutSurface::default();
        assert!(matches!(surface.rasterize(""), Err(RenderError::EmptySurface)));
        assert!(matches!(
            surface.rasterize("  \n <div> </div> "),
            Err(RenderError::EmptySurface)
        ));
    }

    #[test]
    fn test_margins_wider_than_page_fail() {
        let surface = LayoutSurface::new(120.0);
        assert!(matches!(
            surface.rasterize("<p>x</p>"),
            Err(RenderError::NoContentWidth(_))
        ));
    }

    #[test]
    fn test_negative_margin_fails() {
        assert!(matches!(
            LayoutSurface::new(-20.0).rasterize("<p>x</p>"),
            Err(RenderError::NoContentWidth(_))
        ));
    }

    #[test]
    fn test_unbroken_word_stays_in_its_cell() {
        let name = "SuperLongProductNameWithoutAnySpacesAtAll".repeat(3);
        let markup = format!(
            r#"<table>
            <tr><th style="width: 10%">#</th><th style="width: 40%">Item</th><th style="width: 50%">Qty</th></tr>
            <tr><td>1</td><td>{name}</td><td>7</td></tr>
            </table>"#
        );
        let strip = LayoutSurface::default().rasterize(&markup).unwrap();
        let (qty_x, ..) = find(&strip, "7");

        let pieces: Vec<(f32, &str)> = strip
            .commands
            .iter()
            .filter_map(|c| match c {
                PaintCommand::Text { x, text, .. }
                    if !["#", "Item", "Qty", "1", "7"].contains(&text.as_str()) =>
                {
                    Some((*x, text.as_str()))
                }
                _ => None,
            })
            .collect();

        assert!(pieces.len() > 1, "expected the name to wrap: {pieces:?}");
        assert_eq!(pieces.iter().map(|(_, t)| *t).collect::<String>(), name);
        for (x, text) in &pieces {
            assert!(
                x + text_width(text, 12.0, false) <= qty_x,
                "{text:?} at {x} runs past the next column at {qty_x}"
            );
        }
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let surface = LayoutSurface::default();
        let markup = r#"<div class="flex"><p>a</p><p class="font-bold">b</p></div><hr><p>c</p>"#;
        assert_eq!(surface.rasterize(markup).unwrap(), surface.rasterize(markup).unwrap());
    }
}
