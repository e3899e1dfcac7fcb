/// An opaque RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const BLACK: Color = Color(0, 0, 0);
    pub const WHITE: Color = Color(255, 255, 255);
    pub const BORDER: Color = Color(209, 213, 219);

    /// Components scaled to 0.0..=1.0
    pub fn components(&self) -> [f32; 3] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
        ]
    }

    /// Parse `#rgb` or `#rrggbb`
    pub fn from_hex(value: &str) -> Option<Color> {
        let hex = value.trim().strip_prefix('#')?;
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match hex.len() {
            3 => {
                let mut it = hex.chars().map(|c| channel(&c.to_string()).map(|v| v * 17));
                Some(Color(it.next()??, it.next()??, it.next()??))
            }
            6 => Some(Color(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            )),
            _ => None,
        }
    }
}

/// Drawing operations on a strip, in top-down coordinates (points)
#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Color,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        width: f32,
        color: Color,
    },
    /// `baseline` is the y of the text baseline
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        bold: bool,
        color: Color,
        text: String,
    },
}

impl PaintCommand {
    pub fn text(&self) -> Option<&str> {
        match self {
            PaintCommand::Text { text, .. } => Some(text),
            _ => None,
        }
    }
}
