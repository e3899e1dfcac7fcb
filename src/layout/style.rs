//! Computed styles and the baseline style sheet.
//!
//! Styles come from three layers, applied in order: the tag defaults
//! below, utility classes from the `class` attribute, and declarations
//! from the `style` attribute. Lengths are in points.

use scraper::node::Element;

use super::paint::Color;

/// One CSS pixel in points
const PX: f32 = 0.75;
/// One utility spacing step (0.25rem)
const SPACING_STEP: f32 = 3.0;
/// Horizontal padding of table cells
const CELL_PADDING: f32 = 3.0;

pub const ROOT_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Display {
    Block,
    Inline,
    Flex,
    Table,
    Break,
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    // inherited
    pub font_size: f32,
    pub bold: bool,
    pub align: Align,
    pub color: Color,

    // per element
    pub display: Display,
    pub align_explicit: bool,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
    pub padding_x: f32,
    pub border_top: bool,
    pub border_bottom: bool,
    pub background: Option<Color>,
    pub width_pct: Option<f32>,
    pub justify_between: bool,
}

impl Style {
    pub fn root() -> Style {
        Style {
            font_size: ROOT_FONT_SIZE,
            bold: false,
            align: Align::Left,
            color: Color::BLACK,
            display: Display::Block,
            align_explicit: false,
            margin_top: 0.0,
            margin_bottom: 0.0,
            padding_top: 0.0,
            padding_bottom: 0.0,
            padding_x: 0.0,
            border_top: false,
            border_bottom: false,
            background: None,
            width_pct: None,
            justify_between: false,
        }
    }

    fn inherit(&self) -> Style {
        Style {
            font_size: self.font_size,
            bold: self.bold,
            align: self.align,
            color: self.color,
            ..Style::root()
        }
    }

    /// Style of `element` as a child of `self`
    pub fn compute(&self, element: &Element) -> Style {
        let tag = element.name();
        let mut style = self.inherit();
        apply_tag(&mut style, tag);
        if let Some(classes) = element.attr("class") {
            for class in classes.split_whitespace() {
                apply_class(&mut style, class);
            }
        }
        if let Some(css) = element.attr("style") {
            apply_declarations(&mut style, css, self.font_size);
        }
        style
    }

    pub fn set_align(&mut self, align: Align) {
        self.align = align;
        self.align_explicit = true;
    }
}

fn apply_tag(style: &mut Style, tag: &str) {
    style.display = match tag {
        "span" | "strong" | "b" | "em" | "i" | "small" | "a" | "label" | "code" | "sup"
        | "sub" | "u" => Display::Inline,
        "br" => Display::Break,
        "table" => Display::Table,
        "head" | "title" | "script" | "style" | "meta" | "link" | "template" => Display::None,
        _ => Display::Block,
    };

    match tag {
        "h1" => heading(style, 18.0),
        "h2" => heading(style, 15.0),
        "h3" => heading(style, 13.5),
        "h4" | "h5" | "h6" => heading(style, ROOT_FONT_SIZE),
        "strong" | "b" => style.bold = true,
        "small" => style.font_size *= 0.85,
        "hr" => {
            style.border_top = true;
            style.margin_top = 6.0;
            style.margin_bottom = 6.0;
        }
        "th" => {
            style.bold = true;
            style.padding_x = CELL_PADDING;
        }
        "td" => style.padding_x = CELL_PADDING,
        _ => {}
    }
}

fn heading(style: &mut Style, size: f32) {
    style.font_size = size;
    style.bold = true;
}

fn spacing(value: &str) -> Option<f32> {
    value.parse::<f32>().ok().map(|steps| steps * SPACING_STEP)
}

fn gray(shade: &str) -> Option<Color> {
    let color = match shade {
        "50" => Color(249, 250, 251),
        "100" => Color(243, 244, 246),
        "200" => Color(229, 231, 235),
        "300" => Color(209, 213, 219),
        "400" => Color(156, 163, 175),
        "500" => Color(107, 114, 128),
        "600" => Color(75, 85, 99),
        "700" => Color(55, 65, 81),
        "800" => Color(31, 41, 55),
        "900" => Color(17, 24, 39),
        _ => return None,
    };
    Some(color)
}

/// Apply one utility class. Unknown classes are ignored.
fn apply_class(style: &mut Style, class: &str) {
    match class {
        "text-left" => style.set_align(Align::Left),
        "text-center" => style.set_align(Align::Center),
        "text-right" => style.set_align(Align::Right),
        "font-bold" | "font-semibold" | "font-extrabold" => style.bold = true,
        "font-normal" | "font-medium" => style.bold = false,
        "text-xs" => style.font_size = 9.0,
        "text-sm" => style.font_size = 10.5,
        "text-base" => style.font_size = 12.0,
        "text-lg" => style.font_size = 13.5,
        "text-xl" => style.font_size = 15.0,
        "text-2xl" => style.font_size = 18.0,
        "text-3xl" => style.font_size = 22.5,
        "text-black" => style.color = Color::BLACK,
        "text-white" => style.color = Color::WHITE,
        "bg-white" => style.background = Some(Color::WHITE),
        "border" | "border-y" => {
            style.border_top = true;
            style.border_bottom = true;
        }
        "border-t" => style.border_top = true,
        "border-b" => style.border_bottom = true,
        "flex" => style.display = Display::Flex,
        "block" => style.display = Display::Block,
        "inline" => style.display = Display::Inline,
        "hidden" => style.display = Display::None,
        "justify-between" => style.justify_between = true,
        _ => apply_prefixed_class(style, class),
    }
}

fn apply_prefixed_class(style: &mut Style, class: &str) {
    let Some((prefix, value)) = class.split_once('-') else {
        return;
    };

    match prefix {
        "mt" => style.margin_top = spacing(value).unwrap_or(style.margin_top),
        "mb" => style.margin_bottom = spacing(value).unwrap_or(style.margin_bottom),
        "my" => {
            if let Some(v) = spacing(value) {
                style.margin_top = v;
                style.margin_bottom = v;
            }
        }
        "pt" => style.padding_top = spacing(value).unwrap_or(style.padding_top),
        "pb" => style.padding_bottom = spacing(value).unwrap_or(style.padding_bottom),
        "py" => {
            if let Some(v) = spacing(value) {
                style.padding_top = v;
                style.padding_bottom = v;
            }
        }
        "px" => style.padding_x = spacing(value).unwrap_or(style.padding_x),
        "p" => {
            if let Some(v) = spacing(value) {
                style.padding_top = v;
                style.padding_bottom = v;
                style.padding_x = v;
            }
        }
        "text" => {
            if let Some(shade) = value.strip_prefix("gray-") {
                style.color = gray(shade).unwrap_or(style.color);
            }
        }
        "bg" => {
            if let Some(shade) = value.strip_prefix("gray-") {
                style.background = gray(shade).or(style.background);
            }
        }
        _ => {}
    }
}

/// Parse a CSS length into points. `em` is relative to `font_size`.
fn length(value: &str, font_size: f32) -> Option<f32> {
    let value = value.trim();
    if value == "0" {
        return Some(0.0);
    }
    let (number, factor) = if let Some(n) = value.strip_suffix("px") {
        (n, PX)
    } else if let Some(n) = value.strip_suffix("pt") {
        (n, 1.0)
    } else if let Some(n) = value.strip_suffix("rem") {
        (n, ROOT_FONT_SIZE)
    } else if let Some(n) = value.strip_suffix("em") {
        (n, font_size)
    } else if let Some(n) = value.strip_suffix("mm") {
        (n, 72.0 / 25.4)
    } else {
        return None;
    };
    number.trim().parse::<f32>().ok().map(|n| n * factor)
}

/// Apply `style="..."` declarations. `parent_size` resolves `em`.
fn apply_declarations(style: &mut Style, css: &str, parent_size: f32) {
    for declaration in css.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match property.trim() {
            "text-align" => match value {
                "left" | "start" => style.set_align(Align::Left),
                "center" => style.set_align(Align::Center),
                "right" | "end" => style.set_align(Align::Right),
                _ => {}
            },
            "font-weight" => match value {
                "bold" | "bolder" | "600" | "700" | "800" | "900" => style.bold = true,
                "normal" | "lighter" | "400" | "500" => style.bold = false,
                _ => {}
            },
            "font-size" => {
                if let Some(size) = length(value, parent_size) {
                    style.font_size = size;
                }
            }
            "margin-top" => style.margin_top = length(value, style.font_size).unwrap_or(style.margin_top),
            "margin-bottom" => {
                style.margin_bottom = length(value, style.font_size).unwrap_or(style.margin_bottom)
            }
            "padding-top" => {
                style.padding_top = length(value, style.font_size).unwrap_or(style.padding_top)
            }
            "padding-bottom" => {
                style.padding_bottom =
                    length(value, style.font_size).unwrap_or(style.padding_bottom)
            }
            "width" => {
                if let Some(pct) = value.strip_suffix('%').and_then(|n| n.trim().parse().ok()) {
                    style.width_pct = Some(pct);
                }
            }
            "color" => style.color = Color::from_hex(value).unwrap_or(style.color),
            "background" | "background-color" => {
                style.background = Color::from_hex(value).or(style.background)
            }
            "display" => match value {
                "none" => style.display = Display::None,
                "flex" => style.display = Display::Flex,
                "block" => style.display = Display::Block,
                "inline" | "inline-block" => style.display = Display::Inline,
                _ => {}
            },
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn style_of(html: &str, selector: &str) -> Style {
        let doc = Html::parse_fragment(html);
        let sel = Selector::parse(selector).unwrap();
        let el = doc.select(&sel).next().unwrap();
        Style::root().compute(el.value())
    }

    #[test]
    fn test_tag_defaults() {
        let h1 = style_of("<h1>Store</h1>", "h1");
        assert_eq!(h1.font_size, 18.0);
        assert!(h1.bold);
        assert_eq!(h1.display, Display::Block);

        let strong = style_of("<p><strong>x</strong></p>", "strong");
        assert_eq!(strong.display, Display::Inline);
        assert!(strong.bold);

        let hr = style_of("<hr>", "hr");
        assert!(hr.border_top);
    }

    #[test]
    fn test_utility_classes() {
        let s = style_of(
            r#"<div class="flex justify-between text-right text-xs font-bold mt-2 py-1 border-b text-gray-500 unknown-class">x</div>"#,
            "div",
        );
        assert_eq!(s.display, Display::Flex);
        assert!(s.justify_between);
        assert_eq!(s.align, Align::Right);
        assert!(s.align_explicit);
        assert_eq!(s.font_size, 9.0);
        assert!(s.bold);
        assert_eq!(s.margin_top, 6.0);
        assert_eq!(s.padding_top, 3.0);
        assert_eq!(s.padding_bottom, 3.0);
        assert!(s.border_bottom && !s.border_top);
        assert_eq!(s.color, Color(107, 114, 128));
    }

    #[test]
    fn test_inline_declarations() {
        let s = style_of(
            r#"<table><tr><td style="width: 18%; text-align:right; font-size: 16px; font-weight: 700; margin-top: 1em">x</td></tr></table>"#,
            "td",
        );
        assert_eq!(s.width_pct, Some(18.0));
        assert_eq!(s.align, Align::Right);
        assert_eq!(s.font_size, 12.0);
        assert!(s.bold);
        assert_eq!(s.margin_top, 12.0);
        assert_eq!(s.padding_x, CELL_PADDING);
    }

    #[test]
    fn test_inheritance_resets_box_properties() {
        let doc = Html::parse_fragment(r#"<div class="text-center text-sm border-b mt-4"><p>x</p></div>"#);
        let div = doc.select(&Selector::parse("div").unwrap()).next().unwrap();
        let p = doc.select(&Selector::parse("p").unwrap()).next().unwrap();
        let div_style = Style::root().compute(div.value());
        let p_style = div_style.compute(p.value());
        assert_eq!(p_style.align, Align::Center);
        assert!(!p_style.align_explicit);
        assert_eq!(p_style.font_size, 10.5);
        assert!(!p_style.border_bottom);
        assert_eq!(p_style.margin_top, 0.0);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(length("16px", 12.0), Some(12.0));
        assert_eq!(length("10pt", 12.0), Some(10.0));
        assert_eq!(length("2em", 9.0), Some(18.0));
        assert_eq!(length("0", 9.0), Some(0.0));
        assert_eq!(length("auto", 9.0), None);
    }
}
