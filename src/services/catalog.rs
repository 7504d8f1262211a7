use crate::{
    config::AppConfig,
    entities::{
        company::{self, Entity as Company},
        product::{self, Entity as Product, ProductCategory},
        unloading_event::{self, Entity as UnloadingEvent},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, LikeExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{str::FromStr, sync::Arc};
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

const DEFAULT_PACKING: i64 = 8;

/// Trimmed, lower-cased name used for case-insensitive uniqueness.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn require_name(name: &str, what: &str) -> Result<String, ServiceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::ValidationError(format!("{} name is required", what)));
    }
    Ok(trimmed.to_string())
}

fn packing_value(value: Option<i64>, field: &str) -> Result<i32, ServiceError> {
    let value = value.unwrap_or(DEFAULT_PACKING);
    if value < 0 {
        return Err(ServiceError::ValidationError(format!(
            "{} cannot be negative",
            field
        )));
    }
    i32::try_from(value)
        .map_err(|_| ServiceError::ValidationError(format!("{} is too large", field)))
}

fn parse_category(raw: Option<&str>) -> Result<ProductCategory, ServiceError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(ProductCategory::Other),
        Some(value) => ProductCategory::from_str(&value.to_lowercase()).map_err(|_| {
            ServiceError::ValidationError(format!("Unknown product category '{}'", value))
        }),
    }
}

/// `%fragment%` with LIKE wildcards in the fragment matched literally.
fn contains_pattern(fragment: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for ch in fragment.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

async fn company_by_key<C: ConnectionTrait>(
    db: &C,
    key: &str,
) -> Result<Option<company::Model>, ServiceError> {
    Ok(Company::find()
        .filter(company::Column::NameKey.eq(key))
        .one(db)
        .await?)
}

async fn product_by_key<C: ConnectionTrait>(
    db: &C,
    key: &str,
) -> Result<Option<product::Model>, ServiceError> {
    Ok(Product::find()
        .filter(product::Column::NameKey.eq(key))
        .one(db)
        .await?)
}

/// Inserts the company, or returns the row a concurrent caller inserted
/// under the same key. The flag is `true` only for a fresh insert.
async fn insert_company<C: ConnectionTrait>(
    db: &C,
    model: company::ActiveModel,
    key: &str,
) -> Result<(company::Model, bool), ServiceError> {
    match model.insert(db).await {
        Ok(created) => {
            info!(company_id = %created.id, name = %created.name, "Company created");
            Ok((created, true))
        }
        Err(err) if crate::errors::is_unique_violation(&err) => {
            warn!(name_key = %key, "Concurrent company creation; using existing row");
            let existing = company_by_key(db, key).await?.ok_or_else(|| {
                ServiceError::InternalError(format!("Company '{}' vanished after conflict", key))
            })?;
            Ok((existing, false))
        }
        Err(err) => Err(err.into()),
    }
}

async fn insert_product<C: ConnectionTrait>(
    db: &C,
    model: product::ActiveModel,
    key: &str,
) -> Result<(product::Model, bool), ServiceError> {
    match model.insert(db).await {
        Ok(created) => {
            info!(
                product_id = %created.id,
                name = %created.name,
                full_pallet_units = created.full_pallet_units(),
                "Product created"
            );
            Ok((created, true))
        }
        Err(err) if crate::errors::is_unique_violation(&err) => {
            warn!(name_key = %key, "Concurrent product creation; using existing row");
            let existing = product_by_key(db, key).await?.ok_or_else(|| {
                ServiceError::InternalError(format!("Product '{}' vanished after conflict", key))
            })?;
            Ok((existing, false))
        }
        Err(err) => Err(err.into()),
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyInput {
    #[validate(length(max = 120))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateProductInput {
    #[validate(length(max = 150))]
    pub name: String,
    /// One of paper, dry-foods, beverages, dairy, cleaning, oils, snacks, other
    pub category: Option<String>,
    pub units_per_layer: Option<i64>,
    pub layers_per_pallet: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanyCreated {
    pub id: Uuid,
    pub name: String,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CompanySummary {
    pub id: Uuid,
    pub name: String,
}

impl From<company::Model> for CompanySummary {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductCreated {
    pub id: Uuid,
    pub name: String,
    pub units_per_layer: i32,
    pub layers_per_pallet: i32,
    pub full_pallet_units: i64,
    pub created: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub category: ProductCategory,
    pub units_per_layer: i32,
    pub layers_per_pallet: i32,
    pub full_pallet_units: i64,
}

impl From<product::Model> for ProductView {
    fn from(model: product::Model) -> Self {
        let full_pallet_units = model.full_pallet_units();
        Self {
            id: model.id,
            name: model.name,
            category: model.category,
            units_per_layer: model.units_per_layer,
            layers_per_pallet: model.layers_per_pallet,
            full_pallet_units,
        }
    }
}

/// Companies and products referenced by unloading events.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    config: Arc<AppConfig>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Returns the company whose name matches case-insensitively, creating it
    /// if absent. The flag is `true` only when this call inserted the row.
    #[instrument(skip(self))]
    pub async fn find_or_create_company(
        &self,
        name: &str,
    ) -> Result<(company::Model, bool), ServiceError> {
        let display = require_name(name, "Company")?;
        let key = name_key(&display);

        if let Some(existing) = company_by_key(&*self.db, &key).await? {
            return Ok((existing, false));
        }

        let model = company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(display),
            name_key: Set(key.clone()),
            active: Set(true),
            created_at: Set(Utc::now()),
        };
        insert_company(&*self.db, model, &key).await
    }

    /// Same contract as [`Self::find_or_create_company`]; supplied packing is
    /// ignored when the product already exists.
    #[instrument(skip(self))]
    pub async fn find_or_create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<(product::Model, bool), ServiceError> {
        input.validate()?;
        let display = require_name(&input.name, "Product")?;
        let key = name_key(&display);

        if let Some(existing) = product_by_key(&*self.db, &key).await? {
            return Ok((existing, false));
        }

        let category = parse_category(input.category.as_deref())?;
        let units_per_layer = packing_value(input.units_per_layer, "units_per_layer")?;
        let layers_per_pallet = packing_value(input.layers_per_pallet, "layers_per_pallet")?;

        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(display),
            name_key: Set(key.clone()),
            category: Set(category),
            units_per_layer: Set(units_per_layer),
            layers_per_pallet: Set(layers_per_pallet),
            active: Set(true),
            created_at: Set(Utc::now()),
        };

        insert_product(&*self.db, model, &key).await
    }

    /// Companies ordered by name, optionally filtered by a name fragment.
    #[instrument(skip(self))]
    pub async fn search_companies(
        &self,
        query: Option<&str>,
        active_only: bool,
        limit: Option<u64>,
    ) -> Result<Vec<company::Model>, ServiceError> {
        let limit = limit
            .unwrap_or(self.config.company_search_limit)
            .min(self.config.company_search_limit);

        let mut select = Company::find();
        if active_only {
            select = select.filter(company::Column::Active.eq(true));
        }
        if let Some(fragment) = query.map(name_key).filter(|q| !q.is_empty()) {
            select = select.filter(company::Column::NameKey.like(contains_pattern(&fragment)));
        }

        Ok(select
            .order_by_asc(company::Column::Name)
            .limit(limit)
            .all(&*self.db)
            .await?)
    }

    /// Products ordered by category then name.
    #[instrument(skip(self))]
    pub async fn search_products(
        &self,
        active_only: bool,
    ) -> Result<Vec<product::Model>, ServiceError> {
        let mut select = Product::find();
        if active_only {
            select = select.filter(product::Column::Active.eq(true));
        }
        Ok(select
            .order_by_asc(product::Column::Category)
            .order_by_asc(product::Column::Name)
            .all(&*self.db)
            .await?)
    }

    pub async fn get_company(&self, id: Uuid) -> Result<company::Model, ServiceError> {
        Company::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Company {} not found", id)))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", id)))
    }

    /// Hides the company from pickers; existing events keep the reference.
    #[instrument(skip(self))]
    pub async fn deactivate_company(&self, id: Uuid) -> Result<company::Model, ServiceError> {
        let existing = self.get_company(id).await?;
        let mut model: company::ActiveModel = existing.into();
        model.active = Set(false);
        let updated = model.update(&*self.db).await?;
        info!(company_id = %id, "Company deactivated");
        Ok(updated)
    }

    /// Removes the company; its events remain with no company.
    #[instrument(skip(self))]
    pub async fn delete_company(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        if Company::find_by_id(id).one(&txn).await?.is_none() {
            return Err(ServiceError::NotFound(format!("Company {} not found", id)));
        }

        let detached = UnloadingEvent::update_many()
            .col_expr(
                unloading_event::Column::CompanyId,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(unloading_event::Column::CompanyId.eq(id))
            .exec(&txn)
            .await?;
        Company::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        info!(
            company_id = %id,
            detached_events = detached.rows_affected,
            "Company deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use assert_matches::assert_matches;

    fn company_row(name: &str) -> company::ActiveModel {
        company::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            name_key: Set(name_key(name)),
            active: Set(true),
            created_at: Set(Utc::now()),
        }
    }

    #[tokio::test]
    async fn company_insert_conflict_returns_existing_row() {
        let db = memory_pool().await;
        let first = company_row("Acme").insert(&db).await.unwrap();

        let (company, created) = insert_company(&db, company_row("ACME "), "acme")
            .await
            .unwrap();

        assert!(!created);
        assert_eq!(company.id, first.id);
        assert_eq!(company.name, "Acme");
        assert_eq!(Company::find().all(&db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn product_insert_conflict_keeps_original_packing() {
        let db = memory_pool().await;
        let row = |units: i32| product::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set("Rice".to_string()),
            name_key: Set("rice".to_string()),
            category: Set(ProductCategory::Other),
            units_per_layer: Set(units),
            layers_per_pallet: Set(8),
            active: Set(true),
            created_at: Set(Utc::now()),
        };
        let first = row(5).insert(&db).await.unwrap();

        let (product, created) = insert_product(&db, row(12), "rice").await.unwrap();

        assert!(!created);
        assert_eq!(product.id, first.id);
        assert_eq!(product.units_per_layer, 5);
    }

    #[test]
    fn name_key_trims_and_lowercases() {
        assert_eq!(name_key("  Acme Foods "), "acme foods");
        assert_eq!(name_key("ACME"), name_key("acme"));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert_matches!(
            require_name("   ", "Company"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn packing_defaults_and_bounds() {
        assert_eq!(packing_value(None, "units_per_layer").unwrap(), 8);
        assert_eq!(packing_value(Some(0), "units_per_layer").unwrap(), 0);
        assert_matches!(
            packing_value(Some(-1), "units_per_layer"),
            Err(ServiceError::ValidationError(_))
        );
        assert_matches!(
            packing_value(Some(i64::from(i32::MAX) + 1), "layers_per_pallet"),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn category_parsing() {
        assert_eq!(parse_category(None).unwrap(), ProductCategory::Other);
        assert_eq!(parse_category(Some("  ")).unwrap(), ProductCategory::Other);
        assert_eq!(
            parse_category(Some("Dry-Foods")).unwrap(),
            ProductCategory::DryFoods
        );
        assert_matches!(
            parse_category(Some("furniture")),
            Err(ServiceError::ValidationError(_))
        );
    }
}
