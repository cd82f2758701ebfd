//! Discounts

use std::cmp::Reverse;

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, RoundingStrategy, prelude::FromPrimitive, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    bundles::DiscountRule,
    matching::{MatchResult, SlotConsumption},
    products::ProductId,
};

/// Errors specific to discount calculations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// Percentage calculation could not be safely converted.
    #[error("percentage conversion overflowed or was not finite")]
    PercentConversion,

    /// Rule money and matched subtotal use different currencies (rule, subtotal).
    #[error("discount uses currency {0}, but the matched items use {1}")]
    CurrencyMismatch(&'static str, &'static str),
}

/// Calculate the discount a rule grants on a match.
///
/// The result is never negative and never exceeds `matched_subtotal`.
///
/// # Errors
///
/// Returns an error if:
/// - a percentage calculation cannot be safely represented in minor units
///   (`DiscountError::PercentConversion`).
/// - the rule carries money in another currency than the subtotal
///   (`DiscountError::CurrencyMismatch`).
pub fn calculate_discount<'a>(
    result: &MatchResult<'a>,
    rule: &DiscountRule<'_>,
    matched_subtotal: Money<'a, Currency>,
) -> Result<Money<'a, Currency>, DiscountError> {
    let currency = matched_subtotal.currency();

    if let Some(amount) = rule.amount()
        && amount.currency() != currency
    {
        return Err(DiscountError::CurrencyMismatch(
            amount.currency().iso_alpha_code,
            currency.iso_alpha_code,
        ));
    }

    let subtotal = matched_subtotal.to_minor_units().max(0);

    let discount = match rule {
        DiscountRule::Percentage {
            percent,
            min_quantity,
            max_discount,
        } => {
            if min_quantity.is_some_and(|min| result.matched_quantity() < min) {
                0
            } else {
                let amount = percent_of_minor(percent, subtotal)?;

                max_discount
                    .as_ref()
                    .map_or(amount, |cap| amount.min(cap.to_minor_units()))
            }
        }
        DiscountRule::Fixed(amount) => amount.to_minor_units().min(subtotal),
        DiscountRule::BuyXGetY { buy, get, apply_to } => {
            free_units_value(result.matched_slots(), *buy, *get, apply_to.as_ref())
        }
    };

    Ok(Money::from_minor(discount.clamp(0, subtotal), currency))
}

/// Calculate the discount amount in minor units based on a percentage and a minor unit amount.
///
/// # Errors
///
/// Returns an error if:
/// - The percentage calculation overflows or cannot be safely represented (`DiscountError::PercentConversion`).
pub fn percent_of_minor(percent: &Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::PercentConversion)?;

    ((*percent) * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::PercentConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::PercentConversion)
}

/// Value of the units a buy-X-get-Y rule frees, in minor units.
///
/// Units are ordered by price, most expensive first, and cut into groups of `buy + get`.
/// The last `get` units of each full group are free, so every group gives away its
/// cheapest units. With `apply_to`, the same number of free units is instead taken from
/// that product, cheapest first.
fn free_units_value(
    consumed: &[SlotConsumption<'_>],
    buy: u32,
    get: u32,
    apply_to: Option<&ProductId>,
) -> i64 {
    let group = u64::from(buy) + u64::from(get);

    if group == 0 {
        return 0;
    }

    let total_units: u64 = consumed.iter().map(|c| u64::from(c.quantity)).sum();
    let full_groups = total_units / group;
    let free_units = full_groups * u64::from(get);

    if let Some(product) = apply_to {
        let mut units: Vec<&SlotConsumption<'_>> = consumed
            .iter()
            .filter(|consumption| &consumption.product_id == product)
            .collect();

        units.sort_by_key(|consumption| consumption.unit_price.to_minor_units());

        let mut left = free_units;
        let mut value: i64 = 0;

        for consumption in units {
            let taken = left.min(u64::from(consumption.quantity));

            left -= taken;
            value = value.saturating_add(units_value(consumption, taken));
        }

        return value;
    }

    let mut units: Vec<&SlotConsumption<'_>> = consumed.iter().collect();

    units.sort_by(|a, b| {
        (Reverse(a.unit_price.to_minor_units()), &a.product_id)
            .cmp(&(Reverse(b.unit_price.to_minor_units()), &b.product_id))
    });

    let grouped_end = full_groups * group;
    let free_before = |position: u64| {
        let position = position.min(grouped_end);

        (position / group) * u64::from(get) + (position % group).saturating_sub(u64::from(buy))
    };

    let mut position: u64 = 0;
    let mut value: i64 = 0;

    for consumption in units {
        let end = position + u64::from(consumption.quantity);
        let free = free_before(end) - free_before(position);

        value = value.saturating_add(units_value(consumption, free));
        position = end;
    }

    value
}

fn units_value(consumption: &SlotConsumption<'_>, units: u64) -> i64 {
    let units = i64::try_from(units).unwrap_or(i64::MAX);

    consumption.unit_price.to_minor_units().saturating_mul(units)
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use rusty_money::iso::{EUR, GBP};
    use testresult::TestResult;

    use crate::{
        bundles::{Bundle, BundleCategory, BundleSlot},
        cart::{Cart, CartLineItem},
        ledger::ReservationLedger,
        matching::match_bundle,
    };

    use super::*;

    fn line<'a>(product: &str, quantity: i64, minor: i64) -> CartLineItem<'a> {
        CartLineItem::new(product, quantity, Money::from_minor(minor, EUR))
    }

    fn esmaltes<'a>(rule: DiscountRule<'a>, quantity: u32) -> Bundle<'a> {
        Bundle::new(
            "bundle-esmaltes-2-1",
            "Compre 2 Esmaltes, Leve 3!",
            BundleCategory::Promocional,
            vec![
                BundleSlot::optional("impala-esmalte-vermelho", quantity)
                    .with_alternatives(["impala-esmalte-rosa", "impala-esmalte-nude"]),
            ],
            rule,
        )
    }

    #[test]
    fn percent_of_minor_overflow_returns_error() {
        let percent = Percentage::from(2.0);
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));
    }

    #[test]
    fn percent_of_minor_checked_mul_overflow_returns_error() -> TestResult {
        let percent = Percentage::try_from("100000000000000000000")?;
        let result = percent_of_minor(&percent, i64::MAX);

        assert!(matches!(result, Err(DiscountError::PercentConversion)));

        Ok(())
    }

    #[test]
    fn percent_of_minor_rounds_half_away_from_zero() -> TestResult {
        assert_eq!(percent_of_minor(&Percentage::from(0.15), 12_800)?, 1920);
        assert_eq!(percent_of_minor(&Percentage::from(0.5), 1493)?, 747);

        Ok(())
    }

    #[test]
    fn percentage_rule_discounts_the_subtotal() -> TestResult {
        let bundle = Bundle::new(
            "bundle-mega-hair-care",
            "Kit Mega Hair Completo",
            BundleCategory::MegaHair,
            vec![
                BundleSlot::required("1", 1).with_alternatives(["2", "3", "4"]),
                BundleSlot::required("cocochoco-shampoo-gold", 1),
                BundleSlot::required("cocochoco-conditioner-gold", 1),
            ],
            DiscountRule::percentage(Percentage::from(0.15)),
        );

        let cart = Cart::with_items(
            [
                line("4", 1, 9000),
                line("cocochoco-shampoo-gold", 1, 2000),
                line("cocochoco-conditioner-gold", 1, 1800),
            ],
            EUR,
        )?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(1920, EUR));

        Ok(())
    }

    #[test]
    fn percentage_rule_below_min_quantity_is_zero() -> TestResult {
        let rule = DiscountRule::Percentage {
            percent: Percentage::from(0.2),
            min_quantity: Some(3),
            max_discount: None,
        };
        let bundle = esmaltes(rule, 3);
        let cart = Cart::with_items([line("impala-esmalte-rosa", 2, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(0, EUR));

        Ok(())
    }

    #[test]
    fn percentage_rule_is_capped() -> TestResult {
        let rule = DiscountRule::Percentage {
            percent: Percentage::from(0.5),
            min_quantity: None,
            max_discount: Some(Money::from_minor(1000, EUR)),
        };
        let bundle = esmaltes(rule, 3);
        let cart = Cart::with_items([line("impala-esmalte-rosa", 3, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(1000, EUR));

        Ok(())
    }

    #[test]
    fn fixed_rule_never_exceeds_subtotal() -> TestResult {
        let bundle = esmaltes(DiscountRule::Fixed(Money::from_minor(10_000, EUR)), 3);
        let cart = Cart::with_items([line("impala-esmalte-rosa", 3, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(4479, EUR));

        Ok(())
    }

    #[test]
    fn fixed_rule_in_another_currency_errors() -> TestResult {
        let bundle = esmaltes(DiscountRule::Fixed(Money::from_minor(100, GBP)), 3);
        let cart = Cart::with_items([line("impala-esmalte-rosa", 3, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal());

        assert_eq!(discount, Err(DiscountError::CurrencyMismatch("GBP", "EUR")));

        Ok(())
    }

    #[test]
    fn buy_two_get_one_frees_one_identical_unit() -> TestResult {
        let bundle = esmaltes(DiscountRule::buy_x_get_y(2, 1), 3);
        let cart = Cart::with_items([line("impala-esmalte-vermelho", 3, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(1493, EUR));

        Ok(())
    }

    #[test]
    fn buy_two_get_one_frees_the_cheapest_unit_of_each_group() -> TestResult {
        let bundle = esmaltes(DiscountRule::buy_x_get_y(2, 1), 7);
        let cart = Cart::with_items(
            [
                line("impala-esmalte-vermelho", 3, 1500),
                line("impala-esmalte-rosa", 2, 1200),
                line("impala-esmalte-nude", 2, 900),
            ],
            EUR,
        )?;

        // Ordered: 1500 1500 1500 | 1200 1200 900 | 900 (trailing, no discount)
        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(result.matched_quantity(), 7);
        assert_eq!(discount, Money::from_minor(2400, EUR));

        Ok(())
    }

    #[test]
    fn buy_x_get_y_with_apply_to_draws_from_that_product() -> TestResult {
        let rule = DiscountRule::BuyXGetY {
            buy: 2,
            get: 1,
            apply_to: Some("impala-esmalte-rosa".into()),
        };
        let bundle = esmaltes(rule, 3);
        let cart = Cart::with_items(
            [
                line("impala-esmalte-vermelho", 2, 900),
                line("impala-esmalte-rosa", 1, 1500),
            ],
            EUR,
        )?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(1500, EUR));

        Ok(())
    }

    #[test]
    fn buy_x_get_y_without_a_full_group_is_zero() -> TestResult {
        let bundle = esmaltes(DiscountRule::buy_x_get_y(2, 1), 3);
        let cart = Cart::with_items([line("impala-esmalte-vermelho", 2, 1493)], EUR)?;

        let result = match_bundle(&bundle, &cart.stock(), &ReservationLedger::new());
        let discount = calculate_discount(&result, bundle.discount(), result.subtotal())?;

        assert_eq!(discount, Money::from_minor(0, EUR));

        Ok(())
    }
}
