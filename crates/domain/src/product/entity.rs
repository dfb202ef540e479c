//! The product entity and its table mapping.

use entity_store::{AuditInfo, Auditable, Entity, EntityId, FieldValue, PgEntity};
use serde::{Deserialize, Serialize};
use sqlx::Row;
use sqlx::postgres::PgRow;

/// A catalog product.
///
/// `id` and the audit fields are assigned by the entity store; values set
/// by callers are ignored on insert.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<EntityId>,
    pub sku: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(flatten)]
    pub audit: AuditInfo,
}

impl Product {
    /// Entity kind reported in not-found errors.
    pub const KIND: &'static str = "Product";

    /// Creates an unsaved product.
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id: None,
            sku: sku.into(),
            name: name.into(),
            description: description.into(),
            price,
            audit: AuditInfo::default(),
        }
    }
}

/// Product fields usable in filters and orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProductField {
    Id,
    Sku,
    Name,
    Description,
    Price,
}

impl Auditable for Product {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

impl Entity for Product {
    type Field = ProductField;

    fn kind() -> &'static str {
        Self::KIND
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn field(&self, field: ProductField) -> FieldValue {
        match field {
            ProductField::Id => FieldValue::Int(self.id.map_or(0, |id| id.as_i64())),
            ProductField::Sku => FieldValue::Text(self.sku.clone()),
            ProductField::Name => FieldValue::Text(self.name.clone()),
            ProductField::Description => FieldValue::Text(self.description.clone()),
            ProductField::Price => FieldValue::Float(self.price),
        }
    }
}

impl PgEntity for Product {
    const TABLE: &'static str = "products";
    const COLUMNS: &'static [&'static str] = &["sku", "name", "description", "price"];

    fn column(field: ProductField) -> &'static str {
        match field {
            ProductField::Id => "id",
            ProductField::Sku => "sku",
            ProductField::Name => "name",
            ProductField::Description => "description",
            ProductField::Price => "price",
        }
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.sku.clone()),
            FieldValue::Text(self.name.clone()),
            FieldValue::Text(self.description.clone()),
            FieldValue::Float(self.price),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: None,
            sku: row.try_get("sku")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            price: row.try_get("price")?,
            audit: AuditInfo::default(),
        })
    }
}
