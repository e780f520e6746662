//! Price Rounding
//!
//! Cash-friendly price adjustment for a single sale line. The first press in
//! a direction normalises the price to a whole currency unit; further presses
//! snap to the next multiple of [`ROUNDING_STEP`] in that direction.
//! Switching direction clears the opposite counter, so the first press in the
//! new direction normalises again.

use rust_decimal::Decimal;

/// Denomination that repeated presses snap to.
pub const ROUNDING_STEP: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Per-line rounding counters.
///
/// `0` means untouched, `1` means the first tier has been applied. At most one
/// of the two counters is non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoundingState {
    round_up_count: u8,
    round_down_count: u8,
}

impl RoundingState {
    /// Number of upward tiers applied (0 or 1).
    pub fn round_up_count(&self) -> u8 {
        self.round_up_count
    }

    /// Number of downward tiers applied (0 or 1).
    pub fn round_down_count(&self) -> u8 {
        self.round_down_count
    }

    /// Returns true if no rounding has been applied.
    pub fn is_untouched(&self) -> bool {
        self.round_up_count == 0 && self.round_down_count == 0
    }
}

/// Round `price` upwards, updating `state`.
pub fn round_up(price: Decimal, state: &mut RoundingState) -> Decimal {
    if state.round_up_count == 0 {
        state.round_up_count = 1;
        state.round_down_count = 0;

        return price.ceil();
    }

    let remainder = price % ROUNDING_STEP;

    if remainder.is_zero() {
        price + ROUNDING_STEP
    } else {
        price + (ROUNDING_STEP - remainder)
    }
}

/// Round `price` downwards, updating `state`. Never goes below zero.
pub fn round_down(price: Decimal, state: &mut RoundingState) -> Decimal {
    if state.round_down_count == 0 {
        state.round_down_count = 1;
        state.round_up_count = 0;

        return price.floor();
    }

    (price - price % ROUNDING_STEP).max(Decimal::ZERO)
}

/// Restore `original` and clear both counters.
pub fn reset(original: Decimal, state: &mut RoundingState) -> Decimal {
    *state = RoundingState::default();

    original
}
