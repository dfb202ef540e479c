use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgExecutor, PgPool, Postgres, Row};

use crate::{
    Actor, AuditInfo, Clock, Direction, Entity, EntityId, EntityQuery, FieldValue, Filter,
    Mutation, Result, StoreError, SystemClock,
    audit::stamp,
    store::{EntityStore, record_mutation, require_id},
};

type PgQuery<'q> = sqlx::query::Query<'q, Postgres, PgArguments>;

/// Table mapping for entities persisted by [`PostgresEntityStore`].
///
/// The mapping covers business columns only. The store owns the `id`
/// (`BIGSERIAL`) column and the four audit columns: `created_date`,
/// `created_by`, `last_modified_date`, `last_modified_by`.
pub trait PgEntity: Entity {
    /// Table name.
    const TABLE: &'static str;

    /// Business columns, in the order [`values`](PgEntity::values) yields them.
    const COLUMNS: &'static [&'static str];

    /// Column holding a field. Filters and orderings are translated with it.
    fn column(field: Self::Field) -> &'static str;

    /// Business column values, aligned with [`COLUMNS`](PgEntity::COLUMNS).
    fn values(&self) -> Vec<FieldValue>;

    /// Decodes the business columns of a row. Identity and audit fields are
    /// filled in by the store afterwards.
    fn from_row(row: &PgRow) -> std::result::Result<Self, sqlx::Error>;
}

/// PostgreSQL-backed entity store implementation.
///
/// Filters and orderings are compiled into parameterised SQL so matching
/// happens in the database.
pub struct PostgresEntityStore<T> {
    pool: PgPool,
    clock: Arc<dyn Clock>,
    _entity: PhantomData<fn() -> T>,
}

impl<T> Clone for PostgresEntityStore<T> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
            _entity: PhantomData,
        }
    }
}

impl<T: PgEntity> PostgresEntityStore<T> {
    /// Creates a new PostgreSQL entity store.
    pub fn new(pool: PgPool) -> Self {
        Self::with_clock(pool, Arc::new(SystemClock))
    }

    /// Creates a store stamping with the given clock.
    pub fn with_clock(pool: PgPool, clock: Arc<dyn Clock>) -> Self {
        Self {
            pool,
            clock,
            _entity: PhantomData,
        }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn select_sql() -> String {
        format!(
            "SELECT id, {}, created_date, created_by, last_modified_date, last_modified_by FROM {}",
            T::COLUMNS.join(", "),
            T::TABLE
        )
    }

    fn row_to_entity(row: PgRow) -> Result<T> {
        let mut entity = T::from_row(&row)?;
        entity.set_id(EntityId::new(row.try_get("id")?));
        *entity.audit_mut() = AuditInfo {
            created_date: row.try_get("created_date")?,
            created_by: row.try_get("created_by")?,
            last_modified_date: row.try_get("last_modified_date")?,
            last_modified_by: row.try_get("last_modified_by")?,
        };
        Ok(entity)
    }

    /// Inserts an already stamped entity and returns its new identity.
    async fn insert_row<'e, E: PgExecutor<'e>>(executor: E, entity: &T) -> Result<EntityId> {
        let columns = T::COLUMNS.len();
        let placeholders: Vec<String> = (1..=columns + 2).map(|i| format!("${i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}, created_date, created_by, last_modified_date, last_modified_by) \
             VALUES ({}, NULL, NULL) RETURNING id",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders.join(", ")
        );

        let audit = entity.audit();
        let mut query = sqlx::query(&sql);
        for value in entity.values() {
            query = bind_value(query, value);
        }
        let row = query
            .bind(audit.created_date)
            .bind(audit.created_by.clone())
            .fetch_one(executor)
            .await?;

        Ok(EntityId::new(row.try_get("id")?))
    }
}

/// Binds one field value as the next query parameter.
fn bind_value(query: PgQuery<'_>, value: FieldValue) -> PgQuery<'_> {
    match value {
        FieldValue::Int(v) => query.bind(v),
        FieldValue::Float(v) => query.bind(v),
        FieldValue::Text(v) => query.bind(v),
        FieldValue::Timestamp(v) => query.bind(v),
    }
}

/// Renders `LIMIT`/`OFFSET` clauses, pushing their values onto `params`.
///
/// A limit beyond `i64::MAX` means no limit and an offset beyond it is
/// clamped, matching the in-memory store's `take`/`skip` semantics.
fn compile_page(
    limit: Option<usize>,
    offset: Option<usize>,
    params: &mut Vec<FieldValue>,
) -> String {
    let mut sql = String::new();
    if let Some(limit) = limit.and_then(|limit| i64::try_from(limit).ok()) {
        params.push(FieldValue::Int(limit));
        sql.push_str(&format!(" LIMIT ${}", params.len()));
    }
    if let Some(offset) = offset {
        params.push(FieldValue::Int(i64::try_from(offset).unwrap_or(i64::MAX)));
        sql.push_str(&format!(" OFFSET ${}", params.len()));
    }
    sql
}

/// Translates a filter into a SQL boolean expression, pushing the values it
/// compares against onto `params`. Placeholders are numbered from
/// `params.len() + 1`.
fn compile_filter<T: PgEntity>(filter: &Filter<T::Field>, params: &mut Vec<FieldValue>) -> String {
    match filter {
        Filter::All => "TRUE".to_string(),
        Filter::Compare { field, op, value } => {
            params.push(value.clone());
            format!("{} {} ${}", T::column(*field), op.as_sql(), params.len())
        }
        Filter::Contains { field, needle } => {
            params.push(FieldValue::Text(needle.clone()));
            format!("strpos({}, ${}) > 0", T::column(*field), params.len())
        }
        Filter::And(filters) if filters.is_empty() => "TRUE".to_string(),
        Filter::And(filters) => join_filters::<T>(filters, " AND ", params),
        Filter::Or(filters) if filters.is_empty() => "FALSE".to_string(),
        Filter::Or(filters) => join_filters::<T>(filters, " OR ", params),
        Filter::Not(inner) => format!("NOT ({})", compile_filter::<T>(inner, params)),
    }
}

fn join_filters<T: PgEntity>(
    filters: &[Filter<T::Field>],
    separator: &str,
    params: &mut Vec<FieldValue>,
) -> String {
    let parts: Vec<String> = filters
        .iter()
        .map(|f| format!("({})", compile_filter::<T>(f, params)))
        .collect();
    parts.join(separator)
}

fn compile_order<T: PgEntity>(query: &EntityQuery<T::Field>) -> String {
    let mut keys: Vec<String> = query
        .order_by
        .iter()
        .map(|key| {
            let direction = match key.direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            format!("{} {direction}", T::column(key.field))
        })
        .collect();
    keys.push("id ASC".to_string());
    format!(" ORDER BY {}", keys.join(", "))
}

#[async_trait]
impl<T: PgEntity> EntityStore<T> for PostgresEntityStore<T> {
    async fn get_by_id(&self, id: EntityId) -> Result<Option<T>> {
        let sql = format!("{} WHERE id = $1", Self::select_sql());
        let row = sqlx::query(&sql)
            .bind(id.as_i64())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_entity).transpose()
    }

    async fn get_first_matching(&self, filter: Filter<T::Field>) -> Result<Option<T>> {
        let mut params = Vec::new();
        let condition = compile_filter::<T>(&filter, &mut params);
        let sql = format!(
            "{} WHERE {condition} ORDER BY id ASC LIMIT 1",
            Self::select_sql()
        );

        let mut query = sqlx::query(&sql);
        for value in params {
            query = bind_value(query, value);
        }
        let row = query.fetch_optional(&self.pool).await?;

        row.map(Self::row_to_entity).transpose()
    }

    async fn get_all(&self) -> Result<Vec<T>> {
        let sql = format!("{} ORDER BY id ASC", Self::select_sql());
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_entity).collect()
    }

    async fn get_matching(&self, query: EntityQuery<T::Field>) -> Result<Vec<T>> {
        let mut params = Vec::new();
        let condition = compile_filter::<T>(&query.filter, &mut params);
        let mut sql = format!("{} WHERE {condition}", Self::select_sql());
        sql.push_str(&compile_order::<T>(&query));

        sql.push_str(&compile_page(query.limit, query.offset, &mut params));

        let mut sqlx_query = sqlx::query(&sql);
        for value in params {
            sqlx_query = bind_value(sqlx_query, value);
        }

        let rows = sqlx_query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_entity).collect()
    }

    async fn add(&self, mut entity: T, actor: &Actor) -> Result<T> {
        stamp(&mut entity, Mutation::Insert, actor, self.clock.now());
        let id = Self::insert_row(&self.pool, &entity).await?;
        entity.set_id(id);

        record_mutation::<T>(Mutation::Insert, 1);
        Ok(entity)
    }

    async fn add_many(&self, entities: Vec<T>, actor: &Actor) -> Result<Vec<T>> {
        let now = self.clock.now();
        let mut tx = self.pool.begin().await?;

        let mut stored = Vec::with_capacity(entities.len());
        for mut entity in entities {
            stamp(&mut entity, Mutation::Insert, actor, now);
            let id = Self::insert_row(&mut *tx, &entity).await?;
            entity.set_id(id);
            stored.push(entity);
        }

        tx.commit().await?;
        record_mutation::<T>(Mutation::Insert, stored.len() as u64);
        Ok(stored)
    }

    async fn update(&self, mut entity: T, actor: &Actor) -> Result<()> {
        let id = require_id(&entity)?;
        stamp(&mut entity, Mutation::Update, actor, self.clock.now());

        let columns = T::COLUMNS.len();
        let assignments: Vec<String> = T::COLUMNS
            .iter()
            .enumerate()
            .map(|(i, column)| format!("{column} = ${}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {}, last_modified_date = ${}, last_modified_by = ${} WHERE id = ${}",
            T::TABLE,
            assignments.join(", "),
            columns + 1,
            columns + 2,
            columns + 3
        );

        let audit = entity.audit();
        let mut query = sqlx::query(&sql);
        for value in entity.values() {
            query = bind_value(query, value);
        }
        let result = query
            .bind(audit.last_modified_date)
            .bind(audit.last_modified_by.clone())
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: T::kind(),
                id,
            });
        }

        record_mutation::<T>(Mutation::Update, 1);
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<()> {
        let id = require_id(entity)?;
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                kind: T::kind(),
                id,
            });
        }

        record_mutation::<T>(Mutation::Delete, 1);
        Ok(())
    }

    async fn delete_matching(&self, filter: Filter<T::Field>) -> Result<u64> {
        let mut params = Vec::new();
        let condition = compile_filter::<T>(&filter, &mut params);
        let sql = format!("DELETE FROM {} WHERE {condition}", T::TABLE);

        let mut query = sqlx::query(&sql);
        for value in params {
            query = bind_value(query, value);
        }
        let result = query.execute(&self.pool).await?;

        let removed = result.rows_affected();
        record_mutation::<T>(Mutation::Delete, removed);
        Ok(removed)
    }
}
