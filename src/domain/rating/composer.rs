//! Bill composition
//!
//! Combines the energy charge with the tariff's fixed charge, tax, an
//! optional discount, the minimum-charge floor and any previous balance.

use rust_decimal::Decimal;

use super::money::{checked, ensure_within, percentage_of, round_money, MAX_AMOUNT};
use super::resolver::{rate, EnergyCharge};
use crate::domain::bill::{BillCharges, BillLineItem, LineItemType};
use crate::domain::tariff::{SlabTable, Tariff};
use crate::domain::{Consumption, DomainError, DomainResult};

/// Compose the charges of one bill.
///
/// `total = max(energy + fixed + tax − discount, minimum_charge) + previous_balance`
/// with `tax = (energy + fixed) × tax_percentage / 100`. The returned line
/// items sum exactly to `total_amount`.
pub fn compose(
    consumption: &Consumption,
    tariff: &Tariff,
    slabs: &SlabTable,
    previous_balance: Decimal,
    discount: Decimal,
) -> DomainResult<BillCharges> {
    let units = consumption.units()?;
    if units < Decimal::ZERO {
        return Err(DomainError::InvalidConsumption { units });
    }
    if discount < Decimal::ZERO {
        return Err(DomainError::Validation(format!(
            "discount {discount} must not be negative"
        )));
    }
    ensure_within(discount, MAX_AMOUNT, "discount")?;
    ensure_within(previous_balance, MAX_AMOUNT, "previous balance")?;
    ensure_within(tariff.fixed_charge, MAX_AMOUNT, "fixed charge")?;
    ensure_within(tariff.minimum_charge, MAX_AMOUNT, "minimum charge")?;

    let energy = rate(units, slabs)?;
    let mut line_items = energy_line_items(&energy)?;

    let fixed = round_money(tariff.fixed_charge);
    line_items.push(BillLineItem::charge(
        LineItemType::FixedCharge,
        "Fixed charge",
        fixed,
    ));

    let taxable = checked(energy.amount.checked_add(fixed), "taxable amount")?;
    let tax = percentage_of(taxable, tariff.tax_percentage)?;
    line_items.push(BillLineItem::charge(
        LineItemType::Tax,
        format!("Tax ({}%)", tariff.tax_percentage.normalize()),
        tax,
    ));

    let discount = round_money(discount);
    if discount > Decimal::ZERO {
        line_items.push(BillLineItem::charge(
            LineItemType::Discount,
            "Discount",
            -discount,
        ));
    }

    let subtotal = checked(
        taxable
            .checked_add(tax)
            .and_then(|v| v.checked_sub(discount)),
        "bill subtotal",
    )?;
    let minimum = round_money(tariff.minimum_charge);
    let adjustment = checked(minimum.checked_sub(subtotal), "minimum charge adjustment")?
        .max(Decimal::ZERO);
    if adjustment > Decimal::ZERO {
        line_items.push(BillLineItem::charge(
            LineItemType::MinimumChargeAdjustment,
            format!("Minimum charge adjustment (minimum {minimum})"),
            adjustment,
        ));
    }

    let previous_balance = round_money(previous_balance);
    if !previous_balance.is_zero() {
        line_items.push(BillLineItem::charge(
            LineItemType::PreviousBalance,
            "Previous balance",
            previous_balance,
        ));
    }

    let total_amount = checked(
        subtotal
            .checked_add(adjustment)
            .and_then(|v| v.checked_add(previous_balance)),
        "bill total",
    )?;

    Ok(BillCharges {
        consumption: units,
        energy_charges: energy.amount,
        fixed_charges: fixed,
        tax_amount: tax,
        discount,
        minimum_charge_adjustment: adjustment,
        previous_balance,
        late_fee: Decimal::ZERO,
        total_amount,
        line_items,
    })
}

/// One line per charged slab. Lines are rounded to money precision and the
/// last one absorbs the residual so they sum to the energy charge.
fn energy_line_items(energy: &EnergyCharge) -> DomainResult<Vec<BillLineItem>> {
    let mut items: Vec<BillLineItem> = energy
        .breakdown
        .iter()
        .map(|slab| BillLineItem {
            item_type: LineItemType::EnergyCharge,
            description: format!(
                "Slab {}: {} units @ {}",
                slab.slab_number,
                slab.units.normalize(),
                slab.rate.normalize()
            ),
            units: Some(slab.units),
            rate: Some(slab.rate),
            slab_number: Some(slab.slab_number),
            amount: round_money(slab.amount),
        })
        .collect();

    let allocated = items.iter().try_fold(Decimal::ZERO, |sum, item| {
        checked(sum.checked_add(item.amount), "energy charge")
    })?;
    if let Some(last) = items.last_mut() {
        let residual = checked(energy.amount.checked_sub(allocated), "energy charge")?;
        last.amount = checked(last.amount.checked_add(residual), "energy charge")?;
    }
    Ok(items)
}

// ── Tests ──────────────────────────────────────────────────────
