//! PostgreSQL store
//!
//! Queries are assembled at runtime with `QueryBuilder`; column names come
//! from [`col`] constants and every value is bound, never interpolated.

use async_trait::async_trait;
use epr_common::types::{DataSourceType, EventType, SubmissionType, ValidationType};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row, Transaction};
use uuid::Uuid;

use super::{
    col, Change, Direction, Entity, Predicate, QuerySpec, Record, RepositoryError, Source, Store,
    Value,
};
use crate::models::{
    EventKind, IssueSeverity, Submission, SubmissionEvent, ValidationError, ValidationIssue,
    ValidationWarning,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Row mapping for a table
trait PgEntity: Entity + Sized {
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError>;

    /// Values in `COLUMNS` order
    fn values(&self) -> Vec<Value> {
        Self::COLUMNS.iter().map(|c| self.column(c)).collect()
    }
}

fn corrupt(table: &'static str, message: impl ToString) -> RepositoryError {
    RepositoryError::Corrupt {
        table,
        message: message.to_string(),
    }
}

fn discriminator<T>(
    table: &'static str,
    row: &PgRow,
    column: &str,
    lookup: fn(i64) -> Option<T>,
) -> Result<T, RepositoryError> {
    let raw: i64 = row.try_get(column)?;
    lookup(raw).ok_or_else(|| corrupt(table, format!("unknown {column} {raw}")))
}

impl PgEntity for Submission {
    const COLUMNS: &'static [&'static str] = &[
        col::ID,
        col::SUBMISSION_TYPE,
        col::SUBMISSION_PERIOD,
        col::DATA_SOURCE_TYPE,
        col::ORGANISATION_ID,
        col::USER_ID,
        col::COMPLIANCE_SCHEME_ID,
        col::IS_SUBMITTED,
        col::IS_RESUBMISSION,
        col::APP_REFERENCE_NUMBER,
        col::CREATED,
    ];

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        Ok(Submission {
            id: row.try_get(col::ID)?,
            submission_type: discriminator(
                Self::TABLE,
                row,
                col::SUBMISSION_TYPE,
                SubmissionType::from_value,
            )?,
            submission_period: row.try_get(col::SUBMISSION_PERIOD)?,
            data_source_type: discriminator(
                Self::TABLE,
                row,
                col::DATA_SOURCE_TYPE,
                DataSourceType::from_value,
            )?,
            organisation_id: row.try_get(col::ORGANISATION_ID)?,
            user_id: row.try_get(col::USER_ID)?,
            compliance_scheme_id: row.try_get(col::COMPLIANCE_SCHEME_ID)?,
            is_submitted: row.try_get(col::IS_SUBMITTED)?,
            is_resubmission: row.try_get(col::IS_RESUBMISSION)?,
            app_reference_number: row.try_get(col::APP_REFERENCE_NUMBER)?,
            created: row.try_get(col::CREATED)?,
        })
    }
}

impl PgEntity for SubmissionEvent {
    const COLUMNS: &'static [&'static str] = &[
        col::ID,
        col::SUBMISSION_ID,
        col::USER_ID,
        col::CREATED,
        col::EVENT_TYPE,
        col::FILE_ID,
        col::FILE_TYPE,
        col::FILE_NAME,
        col::BLOB_NAME,
        col::REGISTRATION_SET_ID,
        col::DATA,
    ];

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        let event_type = discriminator(Self::TABLE, row, col::EVENT_TYPE, EventType::from_value)?;
        let data: serde_json::Value = row.try_get(col::DATA)?;

        Ok(SubmissionEvent {
            id: row.try_get(col::ID)?,
            submission_id: row.try_get(col::SUBMISSION_ID)?,
            user_id: row.try_get(col::USER_ID)?,
            created: row.try_get(col::CREATED)?,
            kind: EventKind::from_data(event_type, data)?,
        })
    }
}

impl<S: IssueSeverity> PgEntity for ValidationIssue<S> {
    const COLUMNS: &'static [&'static str] = &[
        col::ID,
        col::VALIDATION_EVENT_ID,
        col::BLOB_NAME,
        col::VALIDATION_TYPE,
        col::ROW_NUMBER,
        col::CREATED,
        col::DATA,
    ];

    fn from_row(row: &PgRow) -> Result<Self, RepositoryError> {
        let validation_type = discriminator(
            Self::TABLE,
            row,
            col::VALIDATION_TYPE,
            ValidationType::from_value,
        )?;
        let data: serde_json::Value = row.try_get(col::DATA)?;
        let (error_codes, detail) = Self::split_data(validation_type, data)?;
        let row_number: i64 = row.try_get(col::ROW_NUMBER)?;

        Ok(ValidationIssue::restore(
            row.try_get(col::ID)?,
            row.try_get(col::VALIDATION_EVENT_ID)?,
            row.try_get(col::BLOB_NAME)?,
            i32::try_from(row_number).map_err(|e| corrupt(Self::TABLE, e))?,
            error_codes,
            row.try_get(col::CREATED)?,
            detail,
        ))
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Postgres>, value: Value) {
    match value {
        Value::Null => {
            builder.push("NULL");
        },
        Value::Bool(v) => {
            builder.push_bind(v);
        },
        Value::Int(v) => {
            builder.push_bind(v);
        },
        Value::Text(v) => {
            builder.push_bind(v);
        },
        Value::Uuid(v) => {
            builder.push_bind(v);
        },
        Value::Timestamp(v) => {
            builder.push_bind(v);
        },
        Value::Json(v) => {
            builder.push_bind(sqlx::types::Json(v));
        },
    }
}

fn push_comparison(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: &str,
    op: &str,
    value: &Value,
) {
    if value.is_null() {
        builder.push("FALSE");
        return;
    }
    builder.push(column).push(op);
    push_value(builder, value.clone());
}

fn push_predicate(builder: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::True => {
            builder.push("TRUE");
        },
        Predicate::Eq(c, v) => push_comparison(builder, c, " = ", v),
        Predicate::Gt(c, v) => push_comparison(builder, c, " > ", v),
        Predicate::Ge(c, v) => push_comparison(builder, c, " >= ", v),
        Predicate::Lt(c, v) => push_comparison(builder, c, " < ", v),
        Predicate::In(c, values) => {
            let values: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
            if values.is_empty() {
                builder.push("FALSE");
                return;
            }
            builder.push(*c).push(" IN (");
            for (i, v) in values.into_iter().enumerate() {
                if i > 0 {
                    builder.push(", ");
                }
                push_value(builder, v.clone());
            }
            builder.push(")");
        },
        Predicate::IsNull(c) => {
            builder.push(*c).push(" IS NULL");
        },
        Predicate::IsNotNull(c) => {
            builder.push(*c).push(" IS NOT NULL");
        },
        Predicate::And(parts) => {
            if parts.is_empty() {
                builder.push("TRUE");
                return;
            }
            builder.push("(");
            for (i, p) in parts.iter().enumerate() {
                if i > 0 {
                    builder.push(" AND ");
                }
                push_predicate(builder, p);
            }
            builder.push(")");
        },
    }
}

fn select<T: PgEntity>(spec: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!(
        "SELECT {} FROM {} WHERE ",
        T::COLUMNS.join(", "),
        T::TABLE
    ));
    push_predicate(&mut builder, &spec.predicate);

    for (i, order) in spec.order.iter().enumerate() {
        builder.push(if i == 0 { " ORDER BY " } else { ", " });
        builder.push(order.column).push(match order.direction {
            Direction::Asc => " ASC NULLS LAST",
            Direction::Desc => " DESC NULLS FIRST",
        });
    }
    if let Some(limit) = spec.limit {
        builder.push(" LIMIT ").push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }
    if let Some(offset) = spec.offset {
        builder.push(" OFFSET ").push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }
    builder
}

fn map_write_error(table: &'static str, id: Uuid, err: sqlx::Error) -> RepositoryError {
    let code = err
        .as_database_error()
        .and_then(|db| db.code())
        .map(|c| c.into_owned());
    match code.as_deref() {
        Some(UNIQUE_VIOLATION) => RepositoryError::Conflict { table, id },
        Some(FOREIGN_KEY_VIOLATION) => RepositoryError::ForeignKey {
            table,
            column: "parent",
            id,
        },
        _ => RepositoryError::Database(err),
    }
}

async fn insert<T: PgEntity>(
    tx: &mut Transaction<'_, Postgres>,
    row: &T,
) -> Result<u64, RepositoryError> {
    let mut builder = QueryBuilder::new(format!(
        "INSERT INTO {} ({}) VALUES (",
        T::TABLE,
        T::COLUMNS.join(", ")
    ));
    for (i, value) in row.values().into_iter().enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        push_value(&mut builder, value);
    }
    builder.push(")");

    let result = builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(T::TABLE, row.id(), e))?;
    Ok(result.rows_affected())
}

async fn update<T: PgEntity>(
    tx: &mut Transaction<'_, Postgres>,
    row: &T,
) -> Result<u64, RepositoryError> {
    let mut builder = QueryBuilder::new(format!("UPDATE {} SET ", T::TABLE));
    let assignments = T::COLUMNS.iter().zip(row.values()).filter(|(c, _)| **c != col::ID);
    for (i, (column, value)) in assignments.enumerate() {
        if i > 0 {
            builder.push(", ");
        }
        builder.push(*column).push(" = ");
        push_value(&mut builder, value);
    }
    builder.push(" WHERE id = ").push_bind(row.id());

    let result = builder
        .build()
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(T::TABLE, row.id(), e))?;
    Ok(result.rows_affected())
}

/// Store backed by a Postgres connection pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_rows<T: PgEntity>(&self, spec: &QuerySpec) -> Result<Vec<T>, RepositoryError> {
        let rows = select::<T>(spec).build().fetch_all(&self.pool).await?;
        rows.iter().map(T::from_row).collect()
    }

    async fn exists_row<T: PgEntity>(&self, predicate: &Predicate) -> Result<bool, RepositoryError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT EXISTS (SELECT 1 FROM {} WHERE ", T::TABLE));
        push_predicate(&mut builder, predicate);
        builder.push(")");

        let row = builder.build().fetch_one(&self.pool).await?;
        Ok(row.try_get(0_usize)?)
    }
}

macro_rules! pg_source {
    ($($entity:ty),+ $(,)?) => {$(
        #[async_trait]
        impl Source<$entity> for PgStore {
            async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<$entity>, RepositoryError> {
                self.fetch_rows::<$entity>(spec).await
            }

            async fn exists(&self, predicate: &Predicate) -> Result<bool, RepositoryError> {
                self.exists_row::<$entity>(predicate).await
            }
        }
    )+};
}

pg_source!(Submission, SubmissionEvent, ValidationError, ValidationWarning);

#[async_trait]
impl Store for PgStore {
    async fn commit(&self, changes: Vec<Change>) -> Result<u64, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut rows = 0;

        for change in &changes {
            rows += match change {
                Change::Insert(Record::Submission(r)) => insert(&mut tx, r).await?,
                Change::Insert(Record::Event(r)) => insert(&mut tx, r).await?,
                Change::Insert(Record::Error(r)) => insert(&mut tx, r).await?,
                Change::Insert(Record::Warning(r)) => insert(&mut tx, r).await?,
                Change::Update(Record::Submission(r)) => update(&mut tx, r).await?,
                Change::Update(Record::Event(r)) => update(&mut tx, r).await?,
                Change::Update(Record::Error(r)) => update(&mut tx, r).await?,
                Change::Update(Record::Warning(r)) => update(&mut tx, r).await?,
            };
        }

        tx.commit().await?;
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    #[test]
    fn test_select_renders_filter_order_and_paging() {
        let mut spec = QuerySpec::new(
            Predicate::eq(col::ORGANISATION_ID, Uuid::nil())
                .and(Predicate::is_in(col::SUBMISSION_PERIOD, ["a", "b"]))
                .and(Predicate::IsNull(col::COMPLIANCE_SCHEME_ID)),
        );
        spec.order.push(super::super::Order {
            column: col::CREATED,
            direction: Direction::Desc,
        });
        spec.limit = Some(5);

        let mut builder = select::<Submission>(&spec);
        let sql = builder.build().sql().to_string();
        assert!(sql.starts_with("SELECT id, submission_type"));
        assert!(sql.contains(
            "WHERE (organisation_id = $1 AND submission_period IN ($2, $3) AND compliance_scheme_id IS NULL)"
        ));
        assert!(sql.contains("ORDER BY created DESC NULLS FIRST LIMIT $4"));
    }

    #[test]
    fn test_empty_in_renders_false() {
        let spec = QuerySpec::new(Predicate::is_in::<Uuid>(col::ID, []));
        let mut builder = select::<SubmissionEvent>(&spec);
        assert!(builder.build().sql().ends_with("WHERE FALSE"));
    }
}
