//! Money formatting

use num_traits::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rusty_money::{Money, iso};

pub use rusty_money::iso::Currency;

/// Look up an ISO 4217 currency by its alpha code, e.g. `"CLP"`.
pub fn find_currency(code: &str) -> Option<&'static Currency> {
    iso::find(&code.to_ascii_uppercase())
}

/// Convert a decimal amount to the currency's minor units, rounding to the
/// nearest unit. `None` if the amount does not fit.
pub fn to_minor_units(amount: Decimal, currency: &Currency) -> Option<i64> {
    let scale = Decimal::from(10_i64.checked_pow(currency.exponent)?);

    amount
        .checked_mul(scale)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Format an amount with the currency's symbol and separators.
pub fn format_amount(amount: Decimal, currency: &'static Currency) -> String {
    to_minor_units(amount, currency).map_or_else(
        || format!("{} {}", amount.round_dp(currency.exponent), currency.iso_alpha_code),
        |minor| Money::from_minor(minor, currency).to_string(),
    )
}
