//! Sales
//!
//! A sale record is assembled once at checkout from the cart and the settled
//! payment, then sent to the backend exactly once.

use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use jiff::Timestamp;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    cart::{Cart, CartLine},
    catalog::{ProductId, UserId, line_label},
    ids::TypedId,
    session::TillSessionId,
};

/// Sale ID
pub type SaleId = TypedId<SaleRecord>;

/// Errors raised while settling a payment.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// Cash received does not cover the total.
    #[error("amount received {tendered} is less than the total {total}")]
    InsufficientPayment {
        /// Sale total.
        total: Decimal,

        /// Cash received.
        tendered: Decimal,
    },

    /// Negative amounts are never valid.
    #[error("amount received must not be negative")]
    NegativeAmount,
}

/// Error returned when parsing an unknown payment method.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown payment method: {0}")]
pub struct UnknownPaymentMethod(String);

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Cash, the only method that gives change.
    #[serde(rename = "efectivo", alias = "cash")]
    Cash,

    /// Debit card.
    #[serde(rename = "debito", alias = "debit")]
    Debit,

    /// Credit card.
    #[serde(rename = "credito", alias = "credit")]
    Credit,

    /// Bank transfer.
    #[serde(rename = "transferencia", alias = "transfer")]
    Transfer,

    /// QR code payment.
    #[serde(rename = "qr")]
    Qr,
}

impl PaymentMethod {
    /// All methods, in the order they are offered to the cashier.
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Debit,
        PaymentMethod::Credit,
        PaymentMethod::Transfer,
        PaymentMethod::Qr,
    ];

    /// Backend wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "efectivo",
            PaymentMethod::Debit => "debito",
            PaymentMethod::Credit => "credito",
            PaymentMethod::Transfer => "transferencia",
            PaymentMethod::Qr => "qr",
        }
    }

    /// Returns true if the cashier hands out change for this method.
    pub fn gives_change(self) -> bool {
        matches!(self, PaymentMethod::Cash)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = UnknownPaymentMethod;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "efectivo" | "cash" => Ok(PaymentMethod::Cash),
            "debito" | "debit" => Ok(PaymentMethod::Debit),
            "credito" | "credit" => Ok(PaymentMethod::Credit),
            "transferencia" | "transfer" => Ok(PaymentMethod::Transfer),
            "qr" => Ok(PaymentMethod::Qr),
            other => Err(UnknownPaymentMethod(other.to_string())),
        }
    }
}

/// A payment that covers a sale total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettledPayment {
    method: PaymentMethod,
    amount_paid: Decimal,
    change: Decimal,
}

impl SettledPayment {
    /// Method used.
    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    /// Amount received.
    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    /// Change handed back.
    pub fn change(&self) -> Decimal {
        self.change
    }
}

/// Settle `total` with `method`.
///
/// Cash must cover the total and the difference is returned as change. Card,
/// transfer and QR payments are charged the exact total, so `tendered` is
/// ignored for them.
///
/// # Errors
///
/// Returns a [`PaymentError`] if cash received is negative or below the total.
pub fn settle(
    total: Decimal,
    method: PaymentMethod,
    tendered: Decimal,
) -> Result<SettledPayment, PaymentError> {
    if !method.gives_change() {
        return Ok(SettledPayment {
            method,
            amount_paid: total,
            change: Decimal::ZERO,
        });
    }

    if tendered < Decimal::ZERO {
        return Err(PaymentError::NegativeAmount);
    }

    if tendered < total {
        return Err(PaymentError::InsufficientPayment { total, tendered });
    }

    Ok(SettledPayment {
        method,
        amount_paid: tendered,
        change: tendered - total,
    })
}

/// Snapshot of a cart line inside a sale record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Product sold.
    pub product_id: ProductId,

    /// Product name at sale time.
    pub product_name: String,

    /// Unit price charged.
    pub price: Decimal,

    /// Catalog unit price at selection time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,

    /// Units sold.
    pub quantity: u32,

    /// Variant sold, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_color: Option<String>,
}

impl SaleItem {
    /// `quantity × price`
    pub fn subtotal(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    /// Name qualified by variant.
    pub fn label(&self) -> String {
        line_label(&self.product_name, self.variant_color.as_deref())
    }
}

impl From<&CartLine> for SaleItem {
    fn from(line: &CartLine) -> Self {
        SaleItem {
            product_id: line.product_id().clone(),
            product_name: line.product_name().to_string(),
            price: line.price(),
            original_price: Some(line.original_price()),
            quantity: line.quantity(),
            variant_color: line.variant_color().map(ToString::to_string),
        }
    }
}

/// Sale record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    id: SaleId,
    cashier_id: UserId,
    session_id: TillSessionId,
    date: Timestamp,
    items: Vec<SaleItem>,
    total: Decimal,
    amount_paid: Decimal,
    change: Decimal,
    payment_method: PaymentMethod,
    #[serde(rename = "isCancelled", alias = "cancelled", default)]
    cancelled: bool,
}

impl SaleRecord {
    /// Assemble a record from the cart being checked out.
    pub fn from_cart(
        id: SaleId,
        cashier_id: UserId,
        session_id: TillSessionId,
        date: Timestamp,
        cart: &Cart,
        payment: SettledPayment,
    ) -> Self {
        SaleRecord {
            id,
            cashier_id,
            session_id,
            date,
            items: cart.lines().iter().map(SaleItem::from).collect(),
            total: cart.total(),
            amount_paid: payment.amount_paid(),
            change: payment.change(),
            payment_method: payment.method(),
            cancelled: false,
        }
    }

    /// Sale ID
    pub fn id(&self) -> &SaleId {
        &self.id
    }

    /// Cashier who made the sale.
    pub fn cashier_id(&self) -> &UserId {
        &self.cashier_id
    }

    /// Till session the sale belongs to.
    pub fn session_id(&self) -> &TillSessionId {
        &self.session_id
    }

    /// When the sale was made.
    pub fn date(&self) -> Timestamp {
        self.date
    }

    /// Items sold.
    pub fn items(&self) -> &[SaleItem] {
        &self.items
    }

    /// Sale total.
    pub fn total(&self) -> Decimal {
        self.total
    }

    /// Amount received.
    pub fn amount_paid(&self) -> Decimal {
        self.amount_paid
    }

    /// Change handed back.
    pub fn change(&self) -> Decimal {
        self.change
    }

    /// Payment method.
    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    /// Returns true if the sale has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Flag the record as cancelled after the backend accepted the
    /// cancellation.
    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }
}
