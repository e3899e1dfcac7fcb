use std::fmt::Write;

use crate::bill::format::format_currency;
use crate::bill::BillItem;
use crate::config::FormatSettings;

/// Escape text for use inside element content or a quoted attribute
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Table rows for `{{items}}`, one `<tr>` per item in input order
pub fn render_item_rows(items: &[BillItem], format: &FormatSettings) -> String {
    let mut out = String::new();

    for (i, item) in items.iter().enumerate() {
        let size = match item.size.as_deref() {
            Some(size) if !size.is_empty() => format!(
                r#"<div class="text-xs text-gray-500">Size: {}</div>"#,
                escape_html(size)
            ),
            _ => String::new(),
        };

        // writing to a String cannot fail
        let _ = write!(
            out,
            concat!(
                r#"<tr class="border-b">"#,
                r#"<td class="py-2">{index}</td>"#,
                r#"<td class="py-2"><div class="font-medium">{name}</div>{size}</td>"#,
                r#"<td class="py-2 text-center">{quantity}</td>"#,
                r#"<td class="py-2 text-right">{unit_price}</td>"#,
                r#"<td class="py-2 text-right font-semibold">{total_price}</td>"#,
                "</tr>\n"
            ),
            index = i + 1,
            name = escape_html(&item.product_name),
            size = size,
            quantity = item.quantity,
            unit_price = escape_html(&format_currency(item.unit_price, format)),
            total_price = escape_html(&format_currency(item.total_price, format)),
        );
    }

    out
}
