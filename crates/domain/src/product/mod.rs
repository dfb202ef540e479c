//! Product entity, requests, handlers and service.

mod entity;
mod handlers;
mod requests;
mod seed;
mod service;

pub use entity::{Product, ProductField};
pub use handlers::{
    AddProductHandler, DeleteProductHandler, GetProductHandler, UpdateProductHandler,
};
pub use requests::{AddProduct, DeleteProduct, GetProduct, UpdateProduct};
pub use seed::{baseline_products, seed_products};
pub use service::{ProductService, register_product_handlers};
