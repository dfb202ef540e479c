//! Domain layer for the product catalog service.
//!
//! This crate provides:
//! - the `Product` entity and its PostgreSQL table mapping
//! - the four product requests with their validation rules
//! - the `Projector` capability mapping requests onto entities
//! - the product request handlers and the `ProductService` facade
//! - the cold-start seed loader

pub mod error;
pub mod product;
pub mod projector;

pub use error::ProjectionError;
pub use product::{
    AddProduct, AddProductHandler, DeleteProduct, DeleteProductHandler, GetProduct,
    GetProductHandler, Product, ProductField, ProductService, UpdateProduct, UpdateProductHandler,
    baseline_products, register_product_handlers, seed_products,
};
pub use projector::{ProductProjector, Projector};
