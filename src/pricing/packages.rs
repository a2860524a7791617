// Package Resolver
//
// Packages are fixed-price, fixed-area booth configurations that bundle
// equipment. Selecting the same package twice books two identical units.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::pricing::error::{EngineResult, PricingError};
use crate::validation::{validate_non_negative_amount, validate_area};

/// Equipment bundled into a package
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct PackageEquipment {
    pub equipment_id: i32,
    #[validate(range(min = 1, max = 2147483647, message = "Bundled quantity must be between 1 and 2147483647"))]
    pub quantity: u32,
}

/// Pre-bundled booth configuration offered by an exhibition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Package {
    pub package_id: Uuid,
    pub exhibition_id: i32,
    pub package_name: String,
    pub description: String,
    pub fixed_area_sqm: Decimal,
    pub fixed_price: Decimal,
    pub equipment_list: Vec<PackageEquipment>,
}

impl Package {
    pub fn from_definition(package_id: Uuid, exhibition_id: i32, definition: PackageDefinition) -> Self {
        Self {
            package_id,
            exhibition_id,
            package_name: definition.package_name,
            description: definition.description,
            fixed_area_sqm: definition.fixed_area_sqm,
            fixed_price: definition.fixed_price,
            equipment_list: definition.equipment_list,
        }
    }
}

/// Payload for creating or replacing a package
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PackageDefinition {
    #[validate(length(min = 1, max = 255, message = "Package name must be 1-255 characters"))]
    pub package_name: String,
    #[serde(default)]
    pub description: String,
    #[validate(custom = "validate_area")]
    pub fixed_area_sqm: Decimal,
    #[validate(custom = "validate_non_negative_amount")]
    pub fixed_price: Decimal,
    #[serde(default)]
    #[validate]
    pub equipment_list: Vec<PackageEquipment>,
}

impl PackageDefinition {
    pub fn check(&self) -> EngineResult<()> {
        self.validate()
            .map_err(|e| PricingError::InvalidPackage(e.to_string()))
    }

    /// Distinct equipment ids referenced by the bundle
    pub fn equipment_ids(&self) -> Vec<i32> {
        let mut ids: Vec<i32> = self.equipment_list.iter().map(|item| item.equipment_id).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

/// A package chosen for a booth, possibly several times
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedPackage {
    pub package: Package,
    pub quantity: u32,
}

/// Contracted area and price of a package selection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageTotals {
    pub total_area: Decimal,
    pub total_package_price: Decimal,
}

pub struct PackageResolver;

impl PackageResolver {
    /// Sum area and price over the selection
    ///
    /// An empty selection yields zero totals; callers treat that as
    /// "nothing chosen yet".
    pub fn resolve(selected: &[SelectedPackage]) -> EngineResult<PackageTotals> {
        selected.iter().try_fold(
            PackageTotals {
                total_area: Decimal::ZERO,
                total_package_price: Decimal::ZERO,
            },
            |totals, selection| {
                let quantity = Decimal::from(selection.quantity);
                let total_area = selection
                    .package
                    .fixed_area_sqm
                    .checked_mul(quantity)
                    .and_then(|area| totals.total_area.checked_add(area))
                    .ok_or(PricingError::AmountOutOfRange("total area"))?;
                let total_package_price = selection
                    .package
                    .fixed_price
                    .checked_mul(quantity)
                    .and_then(|price| totals.total_package_price.checked_add(price))
                    .ok_or(PricingError::AmountOutOfRange("total package price"))?;
                Ok(PackageTotals {
                    total_area,
                    total_package_price,
                })
            },
        )
    }
}
