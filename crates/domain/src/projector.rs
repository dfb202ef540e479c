//! Mapping of request payloads onto entity images.

use crate::error::ProjectionError;
use crate::product::{AddProduct, Product, UpdateProduct};

/// Maps a source value onto an entity-shaped destination, field for field.
///
/// Projectors never touch identity or audit fields; those belong to the
/// entity store.
pub trait Projector<S, D>: Send + Sync {
    /// Produces a new destination image from `source`.
    fn project(&self, source: &S) -> Result<D, ProjectionError>;

    /// Overwrites the mapped fields of `destination`, keeping the rest.
    fn project_onto(&self, source: &S, destination: &mut D) -> Result<(), ProjectionError>;
}

/// Projects product requests onto [`Product`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductProjector;

impl ProductProjector {
    fn price(value: f64) -> Result<f64, ProjectionError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(ProjectionError::InvalidValue {
                target: Product::KIND,
                field: "price",
                reason: format!("{value} is not a finite number"),
            })
        }
    }
}

impl Projector<AddProduct, Product> for ProductProjector {
    fn project(&self, source: &AddProduct) -> Result<Product, ProjectionError> {
        let mut product = Product::default();
        self.project_onto(source, &mut product)?;
        Ok(product)
    }

    fn project_onto(
        &self,
        source: &AddProduct,
        destination: &mut Product,
    ) -> Result<(), ProjectionError> {
        destination.price = Self::price(source.price)?;
        destination.sku = source.sku.clone();
        destination.name = source.name.clone();
        destination.description = source.description.clone();
        Ok(())
    }
}

impl Projector<UpdateProduct, Product> for ProductProjector {
    fn project(&self, source: &UpdateProduct) -> Result<Product, ProjectionError> {
        let mut product = Product::default();
        self.project_onto(source, &mut product)?;
        Ok(product)
    }

    fn project_onto(
        &self,
        source: &UpdateProduct,
        destination: &mut Product,
    ) -> Result<(), ProjectionError> {
        destination.price = Self::price(source.price)?;
        destination.name = source.name.clone();
        destination.description = source.description.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use entity_store::{AuditInfo, EntityId};

    use super::*;

    #[test]
    fn add_projects_every_business_field() {
        let request = AddProduct::new("TestSku-1", "Product A", "A description", 49.99);

        let product: Product = ProductProjector.project(&request).unwrap();

        assert_eq!(product.sku, "TestSku-1");
        assert_eq!(product.name, "Product A");
        assert_eq!(product.description, "A description");
        assert_eq!(product.price, 49.99);
        assert_eq!(product.id, None);
        assert_eq!(product.audit, AuditInfo::default());
    }

    #[test]
    fn update_merges_without_touching_sku_identity_or_audit() {
        let mut product = Product::new("TestSku-1", "Product A", "A description", 49.99);
        product.id = Some(EntityId::new(1));
        product.audit.created_by = Some("seed".to_string());
        let request = UpdateProduct::new(EntityId::new(99), "X", "d", 157.2);

        ProductProjector.project_onto(&request, &mut product).unwrap();

        assert_eq!(product.id, Some(EntityId::new(1)));
        assert_eq!(product.sku, "TestSku-1");
        assert_eq!(product.name, "X");
        assert_eq!(product.description, "d");
        assert_eq!(product.price, 157.2);
        assert_eq!(product.audit.created_by.as_deref(), Some("seed"));
    }

    #[test]
    fn non_finite_price_fails_without_partial_writes() {
        let mut product = Product::new("S", "Before", "", 1.0);
        let request = UpdateProduct::new(EntityId::new(1), "After", "", f64::NAN);

        let result = ProductProjector.project_onto(&request, &mut product);

        assert!(matches!(
            result,
            Err(ProjectionError::InvalidValue { field: "price", .. })
        ));
        assert_eq!(product.name, "Before");
    }
}
