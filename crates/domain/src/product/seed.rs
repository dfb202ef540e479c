//! Cold-start seeding of the product catalog.

use entity_store::{Actor, EntityStore, EntityStoreExt};

use super::Product;

/// The baseline catalog inserted into an empty store.
pub fn baseline_products() -> Vec<Product> {
    vec![Product::new(
        "SonKun",
        "Test Product",
        "Test Product description",
        149.99,
    )]
}

/// Inserts the baseline catalog if the store holds no products.
///
/// Returns true if it seeded. Running it against a non-empty store does
/// nothing, so it is safe to call on every start.
pub async fn seed_products<S>(store: &S, actor: &Actor) -> entity_store::Result<bool>
where
    S: EntityStore<Product>,
{
    if !store.is_empty().await? {
        tracing::debug!("Product store already populated, skipping seed");
        return Ok(false);
    }

    let seeded = store.add_many(baseline_products(), actor).await?;
    tracing::info!(
        count = seeded.len(),
        actor = %actor,
        "Seeded baseline products"
    );
    Ok(true)
}
