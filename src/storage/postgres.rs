//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresStore<T>`, one generic store implementation shared by
//! every domain type. Statements are assembled with `sqlx::QueryBuilder`:
//! identifiers (table and column names) come exclusively from the entity's
//! static [`TableSpec`] and sort-key allow-list, and every piece of user
//! input is bound as a parameter. Un-validated identifiers are never
//! concatenated into SQL.
//!
//! Bulk mutations execute each item's statement, in input order, inside
//! one transaction. Any failure (or the caller dropping the future
//! mid-flight) rolls the whole batch back, so partial writes are never
//! observable.

use crate::core::entity::Record;
use crate::core::field::FieldValue;
use crate::core::filter::{Predicate, QueryFilter};
use crate::core::order::OrderBy;
use crate::core::page::Page;
use crate::storage::{EntityStore, StoreError};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgRow};
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::debug;

/// Generic PostgreSQL store for one entity type.
#[derive(Debug, Clone)]
pub struct PostgresStore<T> {
    pool: PgPool,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> PostgresStore<T> {
    /// Create a new store over the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Bind a field value as the next statement parameter.
fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Uuid(v) => builder.push_bind(*v),
        FieldValue::NullableUuid(v) => builder.push_bind(*v),
        FieldValue::Text(v) => builder.push_bind(v.clone()),
        FieldValue::NullableText(v) => builder.push_bind(v.clone()),
        FieldValue::SmallInt(v) => builder.push_bind(*v),
        FieldValue::Bool(v) => builder.push_bind(*v),
        FieldValue::Timestamp(v) => builder.push_bind(*v),
        FieldValue::NullableTimestamp(v) => builder.push_bind(*v),
        FieldValue::TextArray(v) => builder.push_bind(v.clone()),
    };
}

/// Append a WHERE clause for the filter's predicates, AND-combined.
/// An empty filter appends nothing and the statement matches all rows.
fn push_where(builder: &mut QueryBuilder<'_, Postgres>, predicates: &[Predicate]) {
    if predicates.is_empty() {
        return;
    }

    builder.push(" WHERE ");
    for (i, predicate) in predicates.iter().enumerate() {
        if i > 0 {
            builder.push(" AND ");
        }
        match predicate {
            Predicate::Eq { column, value } => {
                builder.push(*column);
                builder.push(" = ");
                push_value(builder, value);
            }
            Predicate::Contains { column, needle } => {
                builder.push(*column);
                builder.push(" LIKE ");
                builder.push_bind(format!("%{needle}%"));
            }
            Predicate::AtLeast { column, value } => {
                builder.push(*column);
                builder.push(" >= ");
                push_value(builder, value);
            }
            Predicate::AtMost { column, value } => {
                builder.push(*column);
                builder.push(" <= ");
                push_value(builder, value);
            }
            Predicate::MemberOf {
                column,
                table,
                select_column,
                match_column,
                value,
            } => {
                builder.push(*column);
                builder.push(" IN (SELECT ");
                builder.push(*select_column);
                builder.push(" FROM ");
                builder.push(*table);
                builder.push(" WHERE ");
                builder.push(*match_column);
                builder.push(" = ");
                builder.push_bind(value.clone());
                builder.push(")");
            }
        }
    }
}

impl<T> PostgresStore<T>
where
    T: Record + for<'r> FromRow<'r, PgRow>,
{
    /// `SELECT <columns> FROM <table>` prefix shared by the read paths.
    fn select_prefix() -> String {
        let spec = T::table();
        format!("SELECT {} FROM {}", spec.columns.join(", "), spec.table)
    }

    /// Collect the values for `columns`, erroring on a column the record
    /// does not map (a table spec out of sync with `Record::field`).
    fn values_for(entity: &T, columns: &[&'static str]) -> Result<Vec<FieldValue>, StoreError> {
        columns
            .iter()
            .map(|column| {
                entity
                    .field(column)
                    .ok_or(StoreError::UnmappedColumn(*column))
            })
            .collect()
    }

    fn insert_statement(entity: &T) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let spec = T::table();
        let values = Self::values_for(entity, spec.columns)?;

        let mut builder = QueryBuilder::new(format!(
            "INSERT INTO {} ({}) VALUES (",
            spec.table,
            spec.columns.join(", ")
        ));
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, value);
        }
        builder.push(")");
        Ok(builder)
    }

    fn update_statement(entity: &T) -> Result<QueryBuilder<'static, Postgres>, StoreError> {
        let spec = T::table();
        let values = Self::values_for(entity, spec.update_columns)?;

        let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", spec.table));
        for (i, (column, value)) in spec.update_columns.iter().zip(values.iter()).enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            builder.push(*column);
            builder.push(" = ");
            push_value(&mut builder, value);
        }
        builder.push(format!(" WHERE {} = ", spec.key_column));
        push_value(&mut builder, &entity.key().into());
        Ok(builder)
    }
}

#[async_trait]
impl<T> EntityStore<T> for PostgresStore<T>
where
    T: Record + for<'r> FromRow<'r, PgRow>,
{
    async fn create(&self, entity: &T) -> Result<(), StoreError> {
        let mut statement = Self::insert_statement(entity)?;
        statement.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn update(&self, entity: &T) -> Result<(), StoreError> {
        let mut statement = Self::update_statement(entity)?;
        statement.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn delete(&self, entity: &T) -> Result<(), StoreError> {
        let spec = T::table();
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "DELETE FROM {} WHERE {} = ",
            spec.table, spec.key_column
        ));
        push_value(&mut builder, &entity.key().into());
        // Zero affected rows is success: delete is idempotent by contract.
        builder.build().execute(&self.pool).await?;
        Ok(())
    }

    async fn query(
        &self,
        filter: &T::Filter,
        order: OrderBy<T::Sort>,
        page: Page,
    ) -> Result<Vec<T>, StoreError> {
        let mut builder = QueryBuilder::<Postgres>::new(Self::select_prefix());
        push_where(&mut builder, &filter.predicates());

        builder.push(format!(
            " ORDER BY {} {}",
            order.column(),
            order.direction.as_sql()
        ));
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());
        builder.push(" LIMIT ");
        builder.push_bind(page.rows_per_page() as i64);

        debug!(table = T::table().table, sql = builder.sql(), "query");

        let rows = builder
            .build_query_as::<T>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, filter: &T::Filter) -> Result<i64, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT count(*) FROM {}", T::table().table));
        push_where(&mut builder, &filter.predicates());

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn query_by_key(&self, key: &T::Key) -> Result<T, StoreError> {
        let spec = T::table();
        let mut builder = QueryBuilder::<Postgres>::new(Self::select_prefix());
        builder.push(format!(" WHERE {} = ", spec.key_column));
        push_value(&mut builder, &key.clone().into());

        builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn query_by_name(&self, name: &str) -> Result<T, StoreError> {
        let spec = T::table();
        let mut builder = QueryBuilder::<Postgres>::new(Self::select_prefix());
        builder.push(format!(" WHERE {} = ", spec.lookup_column));
        builder.push_bind(name.to_string());

        builder
            .build_query_as::<T>()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn bulk_create(&self, entities: &[T]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        for (index, entity) in entities.iter().enumerate() {
            let mut statement =
                Self::insert_statement(entity).map_err(|err| StoreError::item(index, err))?;
            statement
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|err| StoreError::item(index, err.into()))?;
        }

        tx.commit().await.map_err(StoreError::from)
    }

    async fn bulk_update(&self, entities: &[T]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::from)?;

        for (index, entity) in entities.iter().enumerate() {
            let mut statement =
                Self::update_statement(entity).map_err(|err| StoreError::item(index, err))?;
            statement
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|err| StoreError::item(index, err.into()))?;
        }

        tx.commit().await.map_err(StoreError::from)
    }

    async fn bulk_delete(&self, keys: &[T::Key]) -> Result<(), StoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        let spec = T::table();
        let mut builder = QueryBuilder::<Postgres>::new(format!(
            "DELETE FROM {} WHERE {} IN (",
            spec.table, spec.key_column
        ));
        for (i, key) in keys.iter().enumerate() {
            if i > 0 {
                builder.push(", ");
            }
            push_value(&mut builder, &key.clone().into());
        }
        builder.push(")");

        // A single IN-list statement, atomic on its own.
        builder.build().execute(&self.pool).await?;
        Ok(())
    }
}

/// Apply the required tables and indexes (idempotent).
///
/// Intended for development and integration tests; production schema
/// changes go through the external migration pipeline. Safe to call on
/// every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), StoreError> {
    const STATEMENTS: &[&str] = &[
        "CREATE TABLE IF NOT EXISTS galaxies (
            galaxy_id UUID PRIMARY KEY,
            galaxy_name TEXT NOT NULL UNIQUE,
            owner_user_id UUID NOT NULL,
            enabled BOOLEAN NOT NULL,
            date_created TIMESTAMPTZ NOT NULL,
            date_updated TIMESTAMPTZ NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS resource_types (
            resource_type TEXT PRIMARY KEY,
            resource_type_name TEXT NOT NULL,
            resource_category TEXT NOT NULL,
            resource_group TEXT NOT NULL,
            enterable BOOLEAN NOT NULL,
            max_types SMALLINT NOT NULL,
            cr_min SMALLINT NOT NULL, cr_max SMALLINT NOT NULL,
            cd_min SMALLINT NOT NULL, cd_max SMALLINT NOT NULL,
            dr_min SMALLINT NOT NULL, dr_max SMALLINT NOT NULL,
            fl_min SMALLINT NOT NULL, fl_max SMALLINT NOT NULL,
            hr_min SMALLINT NOT NULL, hr_max SMALLINT NOT NULL,
            ma_min SMALLINT NOT NULL, ma_max SMALLINT NOT NULL,
            pe_min SMALLINT NOT NULL, pe_max SMALLINT NOT NULL,
            oq_min SMALLINT NOT NULL, oq_max SMALLINT NOT NULL,
            sr_min SMALLINT NOT NULL, sr_max SMALLINT NOT NULL,
            ut_min SMALLINT NOT NULL, ut_max SMALLINT NOT NULL,
            er_min SMALLINT NOT NULL, er_max SMALLINT NOT NULL,
            container_type TEXT NOT NULL,
            inventory_type TEXT NOT NULL,
            specific_planet SMALLINT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS resource_groups (
            resource_group TEXT PRIMARY KEY,
            group_name TEXT NOT NULL,
            group_level SMALLINT NOT NULL,
            group_order SMALLINT NOT NULL,
            container_type TEXT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS resources (
            resource_id UUID PRIMARY KEY,
            resource_name TEXT NOT NULL UNIQUE,
            galaxy_id UUID NOT NULL,
            added_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            added_user_id UUID NOT NULL,
            resource_type TEXT NOT NULL,
            unavailable_at TIMESTAMPTZ NULL,
            unavailable_user_id UUID NULL,
            verified BOOLEAN NOT NULL,
            verified_user_id UUID NULL,
            cr SMALLINT NOT NULL, cd SMALLINT NOT NULL, dr SMALLINT NOT NULL,
            fl SMALLINT NOT NULL, hr SMALLINT NOT NULL, ma SMALLINT NOT NULL,
            pe SMALLINT NOT NULL, oq SMALLINT NOT NULL, sr SMALLINT NOT NULL,
            ut SMALLINT NOT NULL, er SMALLINT NOT NULL
        )",
        "CREATE TABLE IF NOT EXISTS users (
            user_id UUID PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            roles TEXT[] NOT NULL,
            guild TEXT NULL,
            enabled BOOLEAN NOT NULL,
            date_created TIMESTAMPTZ NOT NULL,
            date_updated TIMESTAMPTZ NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_resources_galaxy ON resources (galaxy_id)",
        "CREATE INDEX IF NOT EXISTS idx_resources_type ON resources (resource_type)",
        "CREATE INDEX IF NOT EXISTS idx_resource_types_group ON resource_types (resource_group)",
    ];

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
