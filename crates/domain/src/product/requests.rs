//! Product requests.
//!
//! Validation rules are declared on the requests themselves; the pipeline's
//! validation behavior evaluates them before any handler runs.

use entity_store::EntityId;
use pipeline::Request;
use serde::{Deserialize, Deserializer, Serialize};
use validator::{Validate, ValidationError};

use super::Product;

/// Rejects empty and whitespace-only text.
fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

/// Reads a missing or `null` text field as empty so validation reports it.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Query for one product by identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct GetProduct {
    pub id: EntityId,
}

impl GetProduct {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl Request for GetProduct {
    /// `None` when no product has the id; absence is not an error here.
    type Response = Option<Product>;
    const NAME: &'static str = "GetProduct";
}

/// Command to add a new product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct AddProduct {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub sku: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub price: f64,
}

impl AddProduct {
    pub fn new(
        sku: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            sku: sku.into(),
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

impl Request for AddProduct {
    type Response = Product;
    const NAME: &'static str = "AddProduct";
}

/// Command replacing the mutable fields of an existing product.
///
/// The SKU is fixed at creation and cannot be changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct UpdateProduct {
    pub id: EntityId,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(custom(function = "not_blank"), length(max = 50))]
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub price: f64,
}

impl UpdateProduct {
    pub fn new(
        id: EntityId,
        name: impl Into<String>,
        description: impl Into<String>,
        price: f64,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description: description.into(),
            price,
        }
    }
}

impl Request for UpdateProduct {
    type Response = ();
    const NAME: &'static str = "UpdateProduct";
}

/// Command to delete a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct DeleteProduct {
    pub id: EntityId,
}

impl DeleteProduct {
    pub fn new(id: EntityId) -> Self {
        Self { id }
    }
}

impl Request for DeleteProduct {
    type Response = ();
    const NAME: &'static str = "DeleteProduct";
}
