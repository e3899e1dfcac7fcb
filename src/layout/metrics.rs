//! Standard-14 Helvetica metrics and WinAnsi text encoding.
//!
//! Widths are the AFM advance widths in 1/1000 em for the printable ASCII
//! range. Everything else falls back to a digit width.

const FIRST: u8 = 32;

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0..9
    278, 278, 584, 584, 584, 556, 1015,                                             // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N..Z
    278, 278, 278, 469, 556, 333,                                                   // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n..z
    334, 260, 334, 584,                                                             // {..~
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Encode text for a WinAnsiEncoding simple font.
///
/// Characters with no WinAnsi code are transliterated when a common
/// spelling exists and replaced by `?` otherwise.
pub fn encode_winansi(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        match ch {
            ' '..='~' => out.push(code as u8),
            '\u{a0}'..='\u{ff}' => out.push(code as u8),
            '\t' | '\n' | '\r' => out.push(b' '),
            '₹' => out.extend_from_slice(b"Rs."),
            _ => out.push(winansi_special(ch).unwrap_or(b'?')),
        }
    }
    out
}

// The 0x80..0x9f block, where WinAnsi differs from Latin-1
fn winansi_special(ch: char) -> Option<u8> {
    let code = match ch {
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8a,
        '‹' => 0x8b,
        'Œ' => 0x8c,
        'Ž' => 0x8e,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9a,
        '›' => 0x9b,
        'œ' => 0x9c,
        'ž' => 0x9e,
        'Ÿ' => 0x9f,
        _ => return None,
    };
    Some(code)
}

fn glyph_width(byte: u8, bold: bool) -> u16 {
    if (FIRST..=b'~').contains(&byte) {
        let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
        return table[(byte - FIRST) as usize];
    }
    match byte {
        0x95 => 350,
        0x97 => 1000,
        0xa0 => 278,
        _ => 556,
    }
}

/// Advance width of `text` in points
pub fn text_width(text: &str, size: f32, bold: bool) -> f32 {
    let units: u32 = encode_winansi(text)
        .into_iter()
        .map(|b| glyph_width(b, bold) as u32)
        .sum();
    units as f32 * size / 1000.0
}
