// Equipment Reconciler
//
// Charges only the equipment units that exceed what the selected packages
// already bundle; bundled units are paid for through the package price.

use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use utoipa::ToSchema;

use crate::pricing::{
    error::{EngineResult, PricingError},
    packages::SelectedPackage,
};

/// Equipment line as configured for the booth, priced from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestedEquipment {
    pub equipment_id: i32,
    pub quantity: u32,
    pub unit_price: Decimal,
}

/// Reconciled charge for one equipment item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EquipmentCharge {
    pub equipment_id: i32,
    pub requested_quantity: u32,
    pub included_quantity: u32,
    pub chargeable_quantity: u32,
    pub unit_price: Decimal,
    pub cost: Decimal,
}

/// Per-item charges and their total
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub charges: Vec<EquipmentCharge>,
    pub additional_cost: Decimal,
}

pub struct EquipmentReconciler;

impl EquipmentReconciler {
    /// Reconcile requested equipment against the selected packages
    ///
    /// Lines sharing an equipment id are merged (quantities summed, first
    /// unit price kept) so each item is reconciled once. Charges come out in
    /// first-seen order.
    pub fn reconcile(
        requested: &[RequestedEquipment],
        selected: &[SelectedPackage],
    ) -> EngineResult<Reconciliation> {
        let included = Self::included_quantities(selected);

        let mut merged: Vec<RequestedEquipment> = Vec::with_capacity(requested.len());
        let mut positions: HashMap<i32, usize> = HashMap::new();
        for line in requested {
            match positions.get(&line.equipment_id) {
                Some(&idx) => {
                    merged[idx].quantity = merged[idx].quantity.saturating_add(line.quantity);
                }
                None => {
                    positions.insert(line.equipment_id, merged.len());
                    merged.push(*line);
                }
            }
        }

        let charges = merged
            .into_iter()
            .map(|line| {
                let included_quantity = included.get(&line.equipment_id).copied().unwrap_or(0);
                let chargeable_quantity = line.quantity.saturating_sub(included_quantity);
                let cost = Decimal::from(chargeable_quantity)
                    .checked_mul(line.unit_price)
                    .ok_or(PricingError::AmountOutOfRange("equipment cost"))?;
                Ok(EquipmentCharge {
                    equipment_id: line.equipment_id,
                    requested_quantity: line.quantity,
                    included_quantity,
                    chargeable_quantity,
                    unit_price: line.unit_price,
                    cost,
                })
            })
            .collect::<EngineResult<Vec<EquipmentCharge>>>()?;

        let additional_cost = charges
            .iter()
            .try_fold(Decimal::ZERO, |total, charge| total.checked_add(charge.cost))
            .ok_or(PricingError::AmountOutOfRange("additional equipment cost"))?;

        Ok(Reconciliation {
            charges,
            additional_cost,
        })
    }

    /// Units of each equipment id bundled across the whole selection
    fn included_quantities(selected: &[SelectedPackage]) -> HashMap<i32, u32> {
        let mut included: HashMap<i32, u32> = HashMap::new();
        for selection in selected {
            for item in &selection.package.equipment_list {
                let units = item.quantity.saturating_mul(selection.quantity);
                let entry = included.entry(item.equipment_id).or_insert(0);
                *entry = entry.saturating_add(units);
            }
        }
        included
    }
}
