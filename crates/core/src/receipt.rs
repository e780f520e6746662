//! Receipt
//!
//! Plain-text receipt for a committed sale.

use std::io;

use rust_decimal::Decimal;
use rusty_money::iso::Currency;
use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{money::format_amount, sales::SaleRecord};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// The output could not be written.
    #[error("failed to write receipt")]
    Io(#[from] io::Error),
}

/// Receipt for a single sale, formatted in one currency.
#[derive(Debug, Clone, Copy)]
pub struct Receipt<'a> {
    sale: &'a SaleRecord,
    currency: &'static Currency,
}

impl<'a> Receipt<'a> {
    /// Create a receipt for `sale`.
    pub fn new(sale: &'a SaleRecord, currency: &'static Currency) -> Self {
        Self { sale, currency }
    }

    /// Write the receipt: header, one row per item, then the payment summary.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Io`] if writing to `out` fails.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        writeln!(out, "Receipt {}", self.sale.id())?;
        writeln!(out, "Date: {}", self.sale.date())?;
        writeln!(out, "Payment: {}", self.sale.payment_method())?;

        let mut builder = Builder::default();

        builder.push_record(["Item", "Qty", "Unit Price", "Subtotal"]);

        for item in self.sale.items() {
            builder.push_record([
                item.label(),
                item.quantity.to_string(),
                self.format(item.price),
                self.format(item.subtotal()),
            ]);
        }

        let mut table = builder.build();

        table.with(Style::modern_rounded());
        table.modify(Columns::new(1..4), Alignment::right());

        writeln!(out, "\n{table}\n")?;

        let summary = [
            ("Total:", self.format(self.sale.total())),
            ("Received:", self.format(self.sale.amount_paid())),
            ("Change:", self.format(self.sale.change())),
        ];

        let value_width = summary
            .iter()
            .map(|(_, value)| value.len())
            .max()
            .unwrap_or_default();

        for (label, value) in summary {
            writeln!(out, " {label:<10}{value:>value_width$}")?;
        }

        Ok(())
    }

    fn format(&self, amount: Decimal) -> String {
        format_amount(amount, self.currency)
    }
}
