//! Receipt
//!
//! Terminal rendering of a [`CartBundleAnalysis`].

use std::io;

use tabled::{
    builder::Builder,
    settings::{Alignment, Style, object::Columns},
};
use thiserror::Error;

use crate::{
    allocation::{BundleApplication, CartBundleAnalysis, PartialMatch, Shortfall},
    matching::{MissingSlot, SlotConsumption},
};

/// Errors that can occur when writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// IO error
    #[error("IO error")]
    IO,
}

/// Write the applied kits, partial matches, suggestions and totals of an analysis.
///
/// # Errors
///
/// Returns `ReceiptError::IO` if writing to `out` fails.
pub fn write_analysis(
    mut out: impl io::Write,
    analysis: &CartBundleAnalysis<'_>,
) -> Result<(), ReceiptError> {
    if analysis.applied_bundles.is_empty() {
        writeln!(out, "\nNo kits applied.").map_err(|_err| ReceiptError::IO)?;
    } else {
        write_table(&mut out, applied_table(&analysis.applied_bundles), 2..5)?;
    }

    if !analysis.partial_matches.is_empty() {
        write_table(&mut out, partial_table(&analysis.partial_matches), 1..2)?;
    }

    if !analysis.suggestions.is_empty() {
        writeln!(out, "\nSuggested kits:").map_err(|_err| ReceiptError::IO)?;

        for bundle in &analysis.suggestions {
            let badge = bundle.badge().map(|badge| format!(" [{badge}]")).unwrap_or_default();

            writeln!(out, "  - {}{badge}", bundle.name()).map_err(|_err| ReceiptError::IO)?;
        }
    }

    write_summary(&mut out, analysis)
}

fn applied_table(applications: &[BundleApplication<'_>]) -> Builder {
    let mut builder = Builder::default();

    builder.push_record(["Kit", "Items", "Original", "Discount", "Final"]);

    for application in applications {
        builder.push_record([
            application.bundle.name().to_string(),
            consumed_items(&application.matched_products),
            application.original_total.to_string(),
            format!("-{}", application.discount_amount),
            application.final_total.to_string(),
        ]);
    }

    builder
}

fn partial_table(partials: &[PartialMatch<'_>]) -> Builder {
    let mut builder = Builder::default();

    builder.push_record(["Kit", "Completion", "Missing"]);

    for partial in partials {
        let missing = match &partial.shortfall {
            Shortfall::MissingSlots => missing_items(&partial.missing_slots),
            Shortfall::BelowMinimumValue { missing } => format!("{missing} more"),
        };

        builder.push_record([
            partial.bundle.name().to_string(),
            format!("{:.2}%", partial.completion_percent),
            missing,
        ]);
    }

    builder
}

fn consumed_items(consumed: &[SlotConsumption<'_>]) -> String {
    consumed
        .iter()
        .map(|c| format!("{} x {}", c.quantity, c.stock_key()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn missing_items(missing: &[MissingSlot<'_>]) -> String {
    missing
        .iter()
        .map(|slot| {
            let optional = if slot.slot.is_required() { "" } else { " (optional)" };

            format!("{} x {}{optional}", slot.missing, slot.slot.primary())
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    right_aligned: std::ops::Range<usize>,
) -> Result<(), ReceiptError> {
    let mut table = builder.build();

    table.with(Style::modern_rounded());
    table.modify(Columns::new(right_aligned), Alignment::right());

    writeln!(out, "\n{table}").map_err(|_err| ReceiptError::IO)
}

fn write_summary(
    out: &mut impl io::Write,
    analysis: &CartBundleAnalysis<'_>,
) -> Result<(), ReceiptError> {
    let lines = [
        (" Subtotal:", analysis.original_total.to_string()),
        (" Kit savings:", analysis.total_bundle_discount.to_string()),
        (" Total:", analysis.final_total.to_string()),
    ];

    let label_width = lines.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let value_width = lines.iter().map(|(_, value)| value.len()).max().unwrap_or(0);

    writeln!(out).map_err(|_err| ReceiptError::IO)?;

    for (label, value) in lines {
        writeln!(out, "{label:<label_width$} {value:>value_width$}")
            .map_err(|_err| ReceiptError::IO)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use jiff::Timestamp;
    use rusty_money::{Money, iso::EUR};
    use testresult::TestResult;

    use crate::{
        allocation::analyze,
        bundles::{Bundle, BundleCategory, BundleSlot, DiscountRule},
        cart::{Cart, CartLineItem},
        catalog::BundleCatalog,
    };

    use super::*;

    fn mega_hair_catalog<'a>() -> BundleCatalog<'a> {
        BundleCatalog::load(
            [Bundle::new(
                "bundle-mega-hair-care",
                "Kit Mega Hair Completo",
                BundleCategory::MegaHair,
                vec![
                    BundleSlot::required("1", 1).with_alternatives(["2", "3", "4"]),
                    BundleSlot::required("cocochoco-shampoo-gold", 1),
                    BundleSlot::required("cocochoco-conditioner-gold", 1),
                ],
                DiscountRule::percentage(Percentage::from(0.15)),
            )
            .with_listing(Some("POUPE 15%".to_string()), None)],
            EUR,
        )
    }

    #[test]
    fn write_analysis_renders_applied_kits_and_totals() -> TestResult {
        let catalog = mega_hair_catalog();
        let cart = Cart::with_items(
            [
                CartLineItem::new("1", 1, Money::from_minor(9000, EUR)),
                CartLineItem::new("cocochoco-shampoo-gold", 1, Money::from_minor(2000, EUR)),
                CartLineItem::new("cocochoco-conditioner-gold", 1, Money::from_minor(1800, EUR)),
            ],
            EUR,
        )?;
        let at: Timestamp = "2026-10-14T12:00:00Z".parse()?;
        let analysis = analyze(&cart, &catalog, at)?;

        let mut out = Vec::new();
        write_analysis(&mut out, &analysis)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("Kit Mega Hair Completo"));
        assert!(output.contains("1 x cocochoco-shampoo-gold"));
        assert!(output.contains("Subtotal:"));
        assert!(output.contains("Kit savings:"));
        assert!(output.contains("Total:"));

        Ok(())
    }

    #[test]
    fn write_analysis_renders_partial_matches_and_suggestions() -> TestResult {
        let catalog = mega_hair_catalog();
        let cart = Cart::with_items(
            [
                CartLineItem::new("2", 1, Money::from_minor(9000, EUR)),
                CartLineItem::new("cocochoco-shampoo-gold", 1, Money::from_minor(2000, EUR)),
            ],
            EUR,
        )?;
        let at: Timestamp = "2026-10-14T12:00:00Z".parse()?;
        let analysis = analyze(&cart, &catalog, at)?;

        let mut out = Vec::new();
        write_analysis(&mut out, &analysis)?;

        let output = String::from_utf8(out)?;

        assert!(output.contains("No kits applied."));
        assert!(output.contains("66.67%"));
        assert!(output.contains("1 x cocochoco-conditioner-gold"));
        assert!(output.contains("Suggested kits:"));
        assert!(output.contains("[POUPE 15%]"));

        Ok(())
    }
}
