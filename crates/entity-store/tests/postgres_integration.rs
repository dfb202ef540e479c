//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p entity-store --test postgres_integration
//! ```

use std::sync::Arc;

use entity_store::{
    Actor, AuditInfo, Auditable, Direction, Entity, EntityId, EntityQuery, EntityStore,
    EntityStoreExt, FieldValue, Filter, PgEntity, PostgresEntityStore, StoreError,
};
use serial_test::serial;
use sqlx::PgPool;
use sqlx::Row;
use sqlx::postgres::PgRow;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

const CREATE_WIDGETS: &str = r#"
CREATE TABLE IF NOT EXISTS widgets (
    id                  BIGSERIAL PRIMARY KEY,
    name                TEXT NOT NULL,
    price               DOUBLE PRECISION NOT NULL,
    created_date        TIMESTAMPTZ,
    created_by          TEXT,
    last_modified_date  TIMESTAMPTZ,
    last_modified_by    TEXT
);
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WidgetField {
    Id,
    Name,
    Price,
}

#[derive(Debug, Clone, PartialEq)]
struct Widget {
    id: Option<EntityId>,
    name: String,
    price: f64,
    audit: AuditInfo,
}

impl Widget {
    fn new(name: &str, price: f64) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            price,
            audit: AuditInfo::default(),
        }
    }
}

impl Auditable for Widget {
    fn audit(&self) -> &AuditInfo {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditInfo {
        &mut self.audit
    }
}

impl Entity for Widget {
    type Field = WidgetField;

    fn kind() -> &'static str {
        "Widget"
    }

    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }

    fn field(&self, field: WidgetField) -> FieldValue {
        match field {
            WidgetField::Id => FieldValue::Int(self.id.map_or(0, |id| id.as_i64())),
            WidgetField::Name => FieldValue::Text(self.name.clone()),
            WidgetField::Price => FieldValue::Float(self.price),
        }
    }
}

impl PgEntity for Widget {
    const TABLE: &'static str = "widgets";
    const COLUMNS: &'static [&'static str] = &["name", "price"];

    fn column(field: WidgetField) -> &'static str {
        match field {
            WidgetField::Id => "id",
            WidgetField::Name => "name",
            WidgetField::Price => "price",
        }
    }

    fn values(&self) -> Vec<FieldValue> {
        vec![
            FieldValue::Text(self.name.clone()),
            FieldValue::Float(self.price),
        ]
    }

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: None,
            name: row.try_get("name")?,
            price: row.try_get("price")?,
            audit: AuditInfo::default(),
        })
    }
}

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            sqlx::raw_sql(CREATE_WIDGETS)
                .execute(&temp_pool)
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an emptied table
async fn get_test_store() -> PostgresEntityStore<Widget> {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE widgets RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresEntityStore::new(pool)
}

async fn seeded_store() -> PostgresEntityStore<Widget> {
    let store = get_test_store().await;
    store
        .add_many(
            vec![
                Widget::new("Product A", 49.99),
                Widget::new("Product B", 29.99),
                Widget::new("Product C", 89.99),
            ],
            &Actor::new("seed"),
        )
        .await
        .unwrap();
    store
}

#[tokio::test]
#[serial]
async fn add_assigns_identity_and_created_stamp() {
    let store = get_test_store().await;

    let stored = store
        .add(Widget::new("Gadget", 10.0), &Actor::new("alice"))
        .await
        .unwrap();

    assert_eq!(stored.id, Some(EntityId::new(1)));
    assert_eq!(stored.audit.created_by.as_deref(), Some("alice"));
    assert!(stored.audit.created_date.is_some());

    let fetched = store.get_by_id(EntityId::new(1)).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Gadget");
    assert_eq!(fetched.audit.created_by.as_deref(), Some("alice"));
    assert!(fetched.audit.last_modified_date.is_none());
}

#[tokio::test]
#[serial]
async fn get_all_and_missing_id() {
    let store = seeded_store().await;

    let all = store.get_all().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "Product A");

    assert!(store.get_by_id(EntityId::new(5)).await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn predicates_are_pushed_down() {
    let store = seeded_store().await;

    let cheap = store
        .find(Filter::eq(WidgetField::Price, 49.99))
        .await
        .unwrap();
    assert_eq!(cheap.len(), 1);

    let none = store
        .find(Filter::eq(WidgetField::Price, 9876.0))
        .await
        .unwrap();
    assert!(none.is_empty());

    let first = store
        .get_first_matching(Filter::contains(WidgetField::Name, "B"))
        .await
        .unwrap();
    assert_eq!(first.map(|w| w.name), Some("Product B".to_string()));
}

#[tokio::test]
#[serial]
async fn ordering_and_paging() {
    let store = seeded_store().await;

    let query = EntityQuery::matching(Filter::gt(WidgetField::Price, 20.0))
        .order_by(WidgetField::Price, Direction::Desc)
        .limit(2);
    let page = store.get_matching(query).await.unwrap();

    let names: Vec<_> = page.iter().map(|w| w.name.as_str()).collect();
    assert_eq!(names, vec!["Product C", "Product A"]);
}

#[tokio::test]
#[serial]
async fn oversized_paging_matches_in_memory_semantics() {
    let store = seeded_store().await;

    let unlimited = EntityQuery::new().limit(usize::MAX);
    assert_eq!(store.get_matching(unlimited).await.unwrap().len(), 3);

    let past_the_end = EntityQuery::new().offset(usize::MAX);
    assert!(store.get_matching(past_the_end).await.unwrap().is_empty());
}

#[tokio::test]
#[serial]
async fn update_stamps_modified_and_keeps_created() {
    let store = seeded_store().await;
    let original = store.get_by_id(EntityId::new(1)).await.unwrap().unwrap();

    let mut changed = original.clone();
    changed.name = "Product X".to_string();
    changed.price = 157.2;
    changed.audit.created_by = Some("forged".to_string());
    store.update(changed, &Actor::new("bob")).await.unwrap();

    let result = store.get_by_id(EntityId::new(1)).await.unwrap().unwrap();
    assert_eq!(result.name, "Product X");
    assert_eq!(result.price, 157.2);
    assert_eq!(result.audit.last_modified_by.as_deref(), Some("bob"));
    assert_eq!(result.audit.created_by.as_deref(), Some("seed"));
    assert_eq!(result.audit.created_date, original.audit.created_date);
}

#[tokio::test]
#[serial]
async fn update_and_delete_missing_rows() {
    let store = seeded_store().await;

    let mut ghost = Widget::new("Ghost", 1.0);
    ghost.id = Some(EntityId::new(50));

    assert!(matches!(
        store.update(ghost.clone(), &Actor::system()).await,
        Err(StoreError::NotFound { .. })
    ));
    assert!(matches!(
        store.delete(&ghost).await,
        Err(StoreError::NotFound { .. })
    ));
}

#[tokio::test]
#[serial]
async fn delete_and_delete_matching() {
    let store = seeded_store().await;

    let first = store.get_by_id(EntityId::new(1)).await.unwrap().unwrap();
    store.delete(&first).await.unwrap();
    assert!(!store.exists(EntityId::new(1)).await.unwrap());

    let removed = store
        .delete_matching(Filter::lt(WidgetField::Price, 50.0))
        .await
        .unwrap();
    assert_eq!(removed, 1);

    let removed = store
        .delete_matching(Filter::eq(WidgetField::Name, "nothing"))
        .await
        .unwrap();
    assert_eq!(removed, 0);
    assert_eq!(store.get_all().await.unwrap().len(), 1);
}
