// Catalog Store
//
// Collaborators consumed by the pricing service: exhibition lookup, rule
// store, package store and equipment catalog. Nothing is cached; every
// quote reads the current definitions.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Equipment, Exhibition};
use crate::pricing::{
    error::{EngineResult, PricingError},
    packages::{Package, PackageDefinition, PackageEquipment},
    rules::{PricingRule, RuleDefinition},
};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn find_exhibition(&self, exhibition_id: i32) -> EngineResult<Option<Exhibition>>;

    /// Rules of an exhibition in definition order
    async fn list_pricing_rules(
        &self,
        exhibition_id: i32,
        include_inactive: bool,
    ) -> EngineResult<Vec<PricingRule>>;

    async fn insert_pricing_rule(&self, rule: &PricingRule) -> EngineResult<()>;

    async fn update_pricing_rule(
        &self,
        rule_id: Uuid,
        definition: &RuleDefinition,
    ) -> EngineResult<Option<PricingRule>>;

    /// Returns false when the rule does not exist
    async fn deactivate_pricing_rule(&self, rule_id: Uuid) -> EngineResult<bool>;

    async fn list_packages(&self, exhibition_id: i32) -> EngineResult<Vec<Package>>;

    async fn insert_package(&self, package: &Package) -> EngineResult<()>;

    async fn update_package(
        &self,
        package_id: Uuid,
        definition: &PackageDefinition,
    ) -> EngineResult<Option<Package>>;

    /// Returns false when the package does not exist
    async fn delete_package(&self, package_id: Uuid) -> EngineResult<bool>;

    /// Catalog entries for the given ids; unknown ids are simply absent
    async fn find_equipment(&self, equipment_ids: &[i32]) -> EngineResult<Vec<Equipment>>;
}

const RULE_COLUMNS: &str = r#"
    rule_id, exhibition_id, rule_name, rule_type, discount_percentage,
    fixed_discount_amount, start_date, end_date, min_area_sqm, max_area_sqm,
    min_participants, priority, is_active
"#;

#[derive(Debug, FromRow)]
struct PackageRow {
    package_id: Uuid,
    exhibition_id: i32,
    package_name: String,
    description: String,
    fixed_area_sqm: Decimal,
    fixed_price: Decimal,
}

#[derive(Debug, FromRow)]
struct PackageEquipmentRow {
    package_id: Uuid,
    equipment_id: i32,
    quantity: i32,
}

/// PostgreSQL-backed catalog
#[derive(Clone)]
pub struct PgCatalogStore {
    pool: PgPool,
}

impl PgCatalogStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_package_equipment(
        &self,
        package_ids: &[Uuid],
    ) -> EngineResult<HashMap<Uuid, Vec<PackageEquipment>>> {
        let rows = sqlx::query_as::<_, PackageEquipmentRow>(
            r#"
            SELECT package_id, equipment_id, quantity
            FROM package_equipment
            WHERE package_id = ANY($1)
            ORDER BY package_id, position
            "#,
        )
        .bind(package_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_package: HashMap<Uuid, Vec<PackageEquipment>> = HashMap::new();
        for row in rows {
            let quantity = u32::try_from(row.quantity).map_err(|_| {
                PricingError::InvalidPackage(format!(
                    "Negative bundled quantity for equipment {} in package {}",
                    row.equipment_id, row.package_id
                ))
            })?;
            by_package.entry(row.package_id).or_default().push(PackageEquipment {
                equipment_id: row.equipment_id,
                quantity,
            });
        }

        Ok(by_package)
    }

    async fn insert_equipment_lines(
        tx: &mut Transaction<'_, Postgres>,
        package_id: Uuid,
        equipment_list: &[PackageEquipment],
    ) -> EngineResult<()> {
        for (position, item) in equipment_list.iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| {
                PricingError::InvalidPackage("Too many bundled equipment lines".to_string())
            })?;
            let quantity = i32::try_from(item.quantity).map_err(|_| {
                PricingError::InvalidPackage(format!(
                    "Bundled quantity for equipment {} is too large",
                    item.equipment_id
                ))
            })?;
            sqlx::query(
                r#"
                INSERT INTO package_equipment (package_id, position, equipment_id, quantity)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(package_id)
            .bind(position)
            .bind(item.equipment_id)
            .bind(quantity)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogStore for PgCatalogStore {
    async fn find_exhibition(&self, exhibition_id: i32) -> EngineResult<Option<Exhibition>> {
        let exhibition = sqlx::query_as::<_, Exhibition>(
            r#"
            SELECT id, name, price_per_sqm, starts_at, ends_at
            FROM exhibitions
            WHERE id = $1
            "#,
        )
        .bind(exhibition_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(exhibition)
    }

    async fn list_pricing_rules(
        &self,
        exhibition_id: i32,
        include_inactive: bool,
    ) -> EngineResult<Vec<PricingRule>> {
        let query = format!(
            "SELECT {} FROM pricing_rules \
             WHERE exhibition_id = $1 AND (is_active OR $2) \
             ORDER BY seq",
            RULE_COLUMNS
        );

        let rules = sqlx::query_as::<_, PricingRule>(&query)
            .bind(exhibition_id)
            .bind(include_inactive)
            .fetch_all(&self.pool)
            .await?;

        Ok(rules)
    }

    async fn insert_pricing_rule(&self, rule: &PricingRule) -> EngineResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pricing_rules (
                rule_id, exhibition_id, rule_name, rule_type, discount_percentage,
                fixed_discount_amount, start_date, end_date, min_area_sqm, max_area_sqm,
                min_participants, priority, is_active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(rule.rule_id)
        .bind(rule.exhibition_id)
        .bind(&rule.rule_name)
        .bind(rule.rule_type)
        .bind(rule.discount_percentage)
        .bind(rule.fixed_discount_amount)
        .bind(rule.start_date)
        .bind(rule.end_date)
        .bind(rule.min_area_sqm)
        .bind(rule.max_area_sqm)
        .bind(rule.min_participants)
        .bind(rule.priority)
        .bind(rule.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_pricing_rule(
        &self,
        rule_id: Uuid,
        definition: &RuleDefinition,
    ) -> EngineResult<Option<PricingRule>> {
        let query = format!(
            "UPDATE pricing_rules SET \
                rule_name = $2, rule_type = $3, discount_percentage = $4, \
                fixed_discount_amount = $5, start_date = $6, end_date = $7, \
                min_area_sqm = $8, max_area_sqm = $9, min_participants = $10, \
                priority = $11, is_active = $12 \
             WHERE rule_id = $1 \
             RETURNING {}",
            RULE_COLUMNS
        );

        let rule = sqlx::query_as::<_, PricingRule>(&query)
            .bind(rule_id)
            .bind(&definition.rule_name)
            .bind(definition.rule_type)
            .bind(definition.discount_percentage)
            .bind(definition.fixed_discount_amount)
            .bind(definition.start_date)
            .bind(definition.end_date)
            .bind(definition.min_area_sqm)
            .bind(definition.max_area_sqm)
            .bind(definition.min_participants)
            .bind(definition.priority)
            .bind(definition.is_active)
            .fetch_optional(&self.pool)
            .await?;

        Ok(rule)
    }

    async fn deactivate_pricing_rule(&self, rule_id: Uuid) -> EngineResult<bool> {
        let result = sqlx::query("UPDATE pricing_rules SET is_active = FALSE WHERE rule_id = $1")
            .bind(rule_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_packages(&self, exhibition_id: i32) -> EngineResult<Vec<Package>> {
        let rows = sqlx::query_as::<_, PackageRow>(
            r#"
            SELECT package_id, exhibition_id, package_name, description, fixed_area_sqm, fixed_price
            FROM packages
            WHERE exhibition_id = $1
            ORDER BY seq
            "#,
        )
        .bind(exhibition_id)
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|row| row.package_id).collect();
        let mut equipment = self.load_package_equipment(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| Package {
                equipment_list: equipment.remove(&row.package_id).unwrap_or_default(),
                package_id: row.package_id,
                exhibition_id: row.exhibition_id,
                package_name: row.package_name,
                description: row.description,
                fixed_area_sqm: row.fixed_area_sqm,
                fixed_price: row.fixed_price,
            })
            .collect())
    }

    async fn insert_package(&self, package: &Package) -> EngineResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO packages (package_id, exhibition_id, package_name, description, fixed_area_sqm, fixed_price)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(package.package_id)
        .bind(package.exhibition_id)
        .bind(&package.package_name)
        .bind(&package.description)
        .bind(package.fixed_area_sqm)
        .bind(package.fixed_price)
        .execute(&mut *tx)
        .await?;

        Self::insert_equipment_lines(&mut tx, package.package_id, &package.equipment_list).await?;

        tx.commit().await?;
        Ok(())
    }

    async fn update_package(
        &self,
        package_id: Uuid,
        definition: &PackageDefinition,
    ) -> EngineResult<Option<Package>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, PackageRow>(
            r#"
            UPDATE packages
            SET package_name = $2, description = $3, fixed_area_sqm = $4, fixed_price = $5
            WHERE package_id = $1
            RETURNING package_id, exhibition_id, package_name, description, fixed_area_sqm, fixed_price
            "#,
        )
        .bind(package_id)
        .bind(&definition.package_name)
        .bind(&definition.description)
        .bind(definition.fixed_area_sqm)
        .bind(definition.fixed_price)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back
        let Some(row) = row else {
            return Ok(None);
        };

        sqlx::query("DELETE FROM package_equipment WHERE package_id = $1")
            .bind(package_id)
            .execute(&mut *tx)
            .await?;
        Self::insert_equipment_lines(&mut tx, package_id, &definition.equipment_list).await?;

        tx.commit().await?;

        Ok(Some(Package {
            package_id: row.package_id,
            exhibition_id: row.exhibition_id,
            package_name: row.package_name,
            description: row.description,
            fixed_area_sqm: row.fixed_area_sqm,
            fixed_price: row.fixed_price,
            equipment_list: definition.equipment_list.clone(),
        }))
    }

    async fn delete_package(&self, package_id: Uuid) -> EngineResult<bool> {
        let result = sqlx::query("DELETE FROM packages WHERE package_id = $1")
            .bind(package_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_equipment(&self, equipment_ids: &[i32]) -> EngineResult<Vec<Equipment>> {
        let equipment = sqlx::query_as::<_, Equipment>(
            r#"
            SELECT id, code_name, price
            FROM equipment
            WHERE id = ANY($1)
            "#,
        )
        .bind(equipment_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(equipment)
    }
}

#[derive(Debug, Default)]
struct MemoryCatalog {
    exhibitions: HashMap<i32, Exhibition>,
    equipment: HashMap<i32, Equipment>,
    rules: Vec<PricingRule>,
    packages: Vec<Package>,
}

/// In-process catalog for local runs and tests
#[derive(Debug, Default)]
pub struct InMemoryCatalogStore {
    inner: RwLock<MemoryCatalog>,
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exhibition(mut self, exhibition: Exhibition) -> Self {
        self.inner.get_mut().exhibitions.insert(exhibition.id, exhibition);
        self
    }

    pub fn with_equipment(mut self, equipment: Equipment) -> Self {
        self.inner.get_mut().equipment.insert(equipment.id, equipment);
        self
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn find_exhibition(&self, exhibition_id: i32) -> EngineResult<Option<Exhibition>> {
        Ok(self.inner.read().await.exhibitions.get(&exhibition_id).cloned())
    }

    async fn list_pricing_rules(
        &self,
        exhibition_id: i32,
        include_inactive: bool,
    ) -> EngineResult<Vec<PricingRule>> {
        let catalog = self.inner.read().await;
        Ok(catalog
            .rules
            .iter()
            .filter(|rule| rule.exhibition_id == exhibition_id)
            .filter(|rule| include_inactive || rule.is_active)
            .cloned()
            .collect())
    }

    async fn insert_pricing_rule(&self, rule: &PricingRule) -> EngineResult<()> {
        self.inner.write().await.rules.push(rule.clone());
        Ok(())
    }

    async fn update_pricing_rule(
        &self,
        rule_id: Uuid,
        definition: &RuleDefinition,
    ) -> EngineResult<Option<PricingRule>> {
        let mut catalog = self.inner.write().await;
        let Some(rule) = catalog.rules.iter_mut().find(|rule| rule.rule_id == rule_id) else {
            return Ok(None);
        };

        *rule = PricingRule::from_definition(rule_id, rule.exhibition_id, definition.clone());
        Ok(Some(rule.clone()))
    }

    async fn deactivate_pricing_rule(&self, rule_id: Uuid) -> EngineResult<bool> {
        let mut catalog = self.inner.write().await;
        match catalog.rules.iter_mut().find(|rule| rule.rule_id == rule_id) {
            Some(rule) => {
                rule.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_packages(&self, exhibition_id: i32) -> EngineResult<Vec<Package>> {
        let catalog = self.inner.read().await;
        Ok(catalog
            .packages
            .iter()
            .filter(|package| package.exhibition_id == exhibition_id)
            .cloned()
            .collect())
    }

    async fn insert_package(&self, package: &Package) -> EngineResult<()> {
        self.inner.write().await.packages.push(package.clone());
        Ok(())
    }

    async fn update_package(
        &self,
        package_id: Uuid,
        definition: &PackageDefinition,
    ) -> EngineResult<Option<Package>> {
        let mut catalog = self.inner.write().await;
        let Some(package) = catalog
            .packages
            .iter_mut()
            .find(|package| package.package_id == package_id)
        else {
            return Ok(None);
        };

        *package = Package::from_definition(package_id, package.exhibition_id, definition.clone());
        Ok(Some(package.clone()))
    }

    async fn delete_package(&self, package_id: Uuid) -> EngineResult<bool> {
        let mut catalog = self.inner.write().await;
        let before = catalog.packages.len();
        catalog.packages.retain(|package| package.package_id != package_id);
        Ok(catalog.packages.len() < before)
    }

    async fn find_equipment(&self, equipment_ids: &[i32]) -> EngineResult<Vec<Equipment>> {
        let catalog = self.inner.read().await;
        Ok(equipment_ids
            .iter()
            .filter_map(|id| catalog.equipment.get(id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::rules::tests::rule;
    use crate::pricing::types::RuleType;
    use rust_decimal_macros::dec;

    fn store() -> InMemoryCatalogStore {
        InMemoryCatalogStore::new()
            .with_exhibition(Exhibition {
                id: 1,
                name: "Spring Trade Fair".to_string(),
                price_per_sqm: Some(dec!(100)),
                starts_at: None,
                ends_at: None,
            })
            .with_equipment(Equipment {
                id: 5,
                code_name: "SPOT-LED".to_string(),
                price: dec!(50),
            })
    }

    #[tokio::test]
    async fn test_rules_listed_in_insertion_order() {
        let store = store();
        let mut inactive = rule("off", 1);
        inactive.is_active = false;
        store.insert_pricing_rule(&rule("first", 2)).await.unwrap();
        store.insert_pricing_rule(&inactive).await.unwrap();
        store.insert_pricing_rule(&rule("third", 1)).await.unwrap();

        let active = store.list_pricing_rules(1, false).await.unwrap();
        let names: Vec<&str> = active.iter().map(|r| r.rule_name.as_str()).collect();
        assert_eq!(names, vec!["first", "third"]);

        assert_eq!(store.list_pricing_rules(1, true).await.unwrap().len(), 3);
        assert!(store.list_pricing_rules(2, true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_deactivate_rule() {
        let store = store();
        let existing = rule("Early bird", 1);
        let rule_id = existing.rule_id;
        store.insert_pricing_rule(&existing).await.unwrap();

        let definition = RuleDefinition {
            rule_name: "Seasonal".to_string(),
            rule_type: RuleType::Seasonal,
            discount_percentage: None,
            fixed_discount_amount: Some(dec!(75)),
            start_date: None,
            end_date: None,
            min_area_sqm: None,
            max_area_sqm: None,
            min_participants: None,
            priority: 4,
            is_active: true,
        };
        let updated = store.update_pricing_rule(rule_id, &definition).await.unwrap().unwrap();
        assert_eq!(updated.rule_name, "Seasonal");
        assert_eq!(updated.exhibition_id, 1);

        assert!(store.deactivate_pricing_rule(rule_id).await.unwrap());
        assert!(store.list_pricing_rules(1, false).await.unwrap().is_empty());
        assert!(!store.deactivate_pricing_rule(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_equipment_skips_unknown_ids() {
        let found = store().find_equipment(&[5, 99]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].code_name, "SPOT-LED");
    }

    #[tokio::test]
    async fn test_package_lifecycle() {
        let store = store();
        let package = Package {
            package_id: Uuid::new_v4(),
            exhibition_id: 1,
            package_name: "Corner booth".to_string(),
            description: String::new(),
            fixed_area_sqm: dec!(12),
            fixed_price: dec!(1000),
            equipment_list: vec![PackageEquipment { equipment_id: 5, quantity: 2 }],
        };
        store.insert_package(&package).await.unwrap();
        assert_eq!(store.list_packages(1).await.unwrap(), vec![package.clone()]);

        let definition = PackageDefinition {
            package_name: "Corner booth XL".to_string(),
            description: "Two walls".to_string(),
            fixed_area_sqm: dec!(18),
            fixed_price: dec!(1400),
            equipment_list: Vec::new(),
        };
        let updated = store
            .update_package(package.package_id, &definition)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.fixed_area_sqm, dec!(18));
        assert!(updated.equipment_list.is_empty());

        assert!(store.delete_package(package.package_id).await.unwrap());
        assert!(!store.delete_package(package.package_id).await.unwrap());
        assert!(store.list_packages(1).await.unwrap().is_empty());
    }
}
