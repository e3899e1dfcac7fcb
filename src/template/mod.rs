//! Placeholder substitution for bill templates.
//!
//! A template is plain markup with `{{name}}` placeholders. It is scanned
//! once into literal and placeholder segments; rendering evaluates each
//! distinct placeholder a single time and concatenates the segments.
//! Names that are not recognized are kept as literal text.

mod items;

pub use items::{escape_html, render_item_rows};

use std::collections::HashMap;

use crate::bill::format::{format_currency, format_date, format_number, format_time};
use crate::bill::{BillData, BillItem, StoreSettings};
use crate::config::FormatSettings;

/// A recognized placeholder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    StoreName,
    AddressLine1,
    AddressLine2,
    Phone,
    GstNumber,
    BillNumber,
    Date,
    Time,
    PaymentMode,
    Subtotal,
    DiscountAmount,
    Total,
    CashAmount,
    UpiAmount,
    DiscountPercent,
    Items,
}

impl Field {
    pub fn from_name(name: &str) -> Option<Field> {
        let field = match name {
            "storeName" => Field::StoreName,
            "addressLine1" => Field::AddressLine1,
            "addressLine2" => Field::AddressLine2,
            "phone" => Field::Phone,
            "gstNumber" => Field::GstNumber,
            "billNumber" => Field::BillNumber,
            "date" => Field::Date,
            "time" => Field::Time,
            "paymentMode" => Field::PaymentMode,
            "subtotal" => Field::Subtotal,
            "discountAmount" => Field::DiscountAmount,
            "total" => Field::Total,
            "cashAmount" => Field::CashAmount,
            "upiAmount" => Field::UpiAmount,
            "discountPercent" => Field::DiscountPercent,
            "items" => Field::Items,
            _ => return None,
        };
        Some(field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Placeholder(Field),
}

/// Everything a template can draw values from
#[derive(Debug, Clone, Copy)]
pub struct BillContext<'a> {
    pub bill: &'a BillData,
    pub items: &'a [BillItem],
    pub store: &'a StoreSettings,
    pub format: &'a FormatSettings,
}

impl BillContext<'_> {
    /// Markup-ready value for a field
    pub fn value(&self, field: Field) -> String {
        let bill = self.bill;
        let store = self.store;
        let money = |amount: f64| escape_html(&format_currency(amount, self.format));

        match field {
            Field::StoreName => escape_html(&store.store_name),
            Field::AddressLine1 => escape_html(&store.address_line1),
            Field::AddressLine2 => escape_html(&store.address_line2),
            Field::Phone => escape_html(&store.phone),
            Field::GstNumber => escape_html(&store.gst_number),
            Field::BillNumber => escape_html(&bill.bill_number),
            Field::Date => escape_html(&format_date(&bill.created_at, self.format)),
            Field::Time => escape_html(&format_time(&bill.created_at, self.format)),
            Field::PaymentMode => bill.payment_mode.as_str().to_uppercase(),
            Field::Subtotal => money(bill.subtotal),
            Field::DiscountAmount => money(bill.discount_amount),
            Field::Total => money(bill.total),
            Field::CashAmount => money(bill.cash_amount.unwrap_or(0.0)),
            Field::UpiAmount => money(bill.upi_amount.unwrap_or(0.0)),
            Field::DiscountPercent => format_number(bill.discount_percent),
            Field::Items => render_item_rows(self.items, self.format),
        }
    }
}

/// A tokenized template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    /// Tokenize template text. Never fails: anything that is not a
    /// well-formed, recognized placeholder is kept as literal text.
    pub fn parse(source: &str) -> Template {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(open) = rest.find("{{") {
            let after = &rest[open + 2..];
            let Some(close) = after.find("}}") else {
                break;
            };
            let name = &after[..close];

            // "{{{x}}}": the first brace is text, the placeholder starts one later
            if name.contains('{') || name.contains('}') {
                literal.push_str(&rest[..open + 1]);
                rest = &rest[open + 1..];
                continue;
            }

            literal.push_str(&rest[..open]);
            match Field::from_name(name) {
                Some(field) => {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(field));
                }
                None => {
                    literal.push_str(&rest[open..open + 2 + close + 2]);
                }
            }
            rest = &after[close + 2..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Template { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Distinct placeholders in first-use order
    pub fn fields(&self) -> Vec<Field> {
        let mut fields = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(field) = segment {
                if !fields.contains(field) {
                    fields.push(*field);
                }
            }
        }
        fields
    }

    /// Substitute every placeholder
    pub fn render(&self, ctx: &BillContext<'_>) -> String {
        let values: HashMap<Field, String> = self
            .fields()
            .into_iter()
            .map(|field| (field, ctx.value(field)))
            .collect();

        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(field) => {
                    if let Some(value) = values.get(field) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}
