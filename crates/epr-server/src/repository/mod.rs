//! Repository layer
//!
//! Handlers read through a [`QueryRepository`] and write through a
//! [`CommandRepository`]. Both sit on a [`Store`], which is implemented by the
//! Postgres backend ([`PgStore`]) and the in-memory backend ([`MemoryStore`]).
//!
//! Reads are expressed as a small predicate tree over named columns so each
//! backend can evaluate filtering, ordering and limits itself: the Postgres
//! store renders them to SQL, the memory store applies them to its rows.
//!
//! Every call is raced against the request's cancellation token.

use std::cmp::Ordering;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::{Submission, SubmissionEvent, ValidationError, ValidationWarning};

pub mod entity;
pub mod memory;
pub mod postgres;

pub use entity::col;
pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Failed to (de)serialize stored payload: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Row {id} already exists in {table}")]
    Conflict { table: &'static str, id: Uuid },

    #[error("{table}.{column} references missing row {id}")]
    ForeignKey {
        table: &'static str,
        column: &'static str,
        id: Uuid,
    },

    #[error("Corrupt row in {table}: {message}")]
    Corrupt { table: &'static str, message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

/// A column value as seen by predicates and by the SQL binder
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Ordering between two values of the same kind; `None` across kinds
    /// and for nulls
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Uuid(a), Value::Uuid(b)) => Some(a.cmp(b)),
            (Value::Timestamp(a), Value::Timestamp(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Sort order with nulls last, as Postgres sorts ascending
    fn sort_cmp(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Null, _) => Ordering::Greater,
            (_, Value::Null) => Ordering::Less,
            (a, b) => a.compare(b).unwrap_or(Ordering::Equal),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Uuid> for Value {
    fn from(v: Uuid) -> Self {
        Value::Uuid(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Value::Timestamp(v)
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Json(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

/// Filter expression over named columns
///
/// Comparisons against [`Value::Null`] never match, as in SQL; use
/// [`Predicate::IsNull`] instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    True,
    Eq(&'static str, Value),
    In(&'static str, Vec<Value>),
    Gt(&'static str, Value),
    Ge(&'static str, Value),
    Lt(&'static str, Value),
    IsNull(&'static str),
    IsNotNull(&'static str),
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn eq(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Eq(column, value.into())
    }

    pub fn is_in<V: Into<Value>>(column: &'static str, values: impl IntoIterator<Item = V>) -> Self {
        Predicate::In(column, values.into_iter().map(Into::into).collect())
    }

    pub fn gt(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Gt(column, value.into())
    }

    pub fn ge(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Ge(column, value.into())
    }

    pub fn lt(column: &'static str, value: impl Into<Value>) -> Self {
        Predicate::Lt(column, value.into())
    }

    /// Conjunction, flattening nested `And`s and dropping `True`
    pub fn and(self, other: Predicate) -> Self {
        let mut parts = Vec::new();
        for p in [self, other] {
            match p {
                Predicate::True => {},
                Predicate::And(inner) => parts.extend(inner),
                p => parts.push(p),
            }
        }
        match parts.len() {
            0 => Predicate::True,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Evaluates the predicate against an entity in memory
    pub fn matches<E: Entity>(&self, entity: &E) -> bool {
        let cmp = |column: &str, value: &Value, accept: fn(Ordering) -> bool| {
            entity
                .column(column)
                .compare(value)
                .is_some_and(accept)
        };

        match self {
            Predicate::True => true,
            Predicate::Eq(c, v) => cmp(c, v, Ordering::is_eq),
            Predicate::In(c, vs) => {
                let actual = entity.column(c);
                vs.iter()
                    .any(|v| actual.compare(v).is_some_and(Ordering::is_eq))
            },
            Predicate::Gt(c, v) => cmp(c, v, Ordering::is_gt),
            Predicate::Ge(c, v) => cmp(c, v, Ordering::is_ge),
            Predicate::Lt(c, v) => cmp(c, v, Ordering::is_lt),
            Predicate::IsNull(c) => entity.column(c).is_null(),
            Predicate::IsNotNull(c) => !entity.column(c).is_null(),
            Predicate::And(ps) => ps.iter().all(|p| p.matches(entity)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// Everything a backend needs to answer a read
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub predicate: Predicate,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl QuerySpec {
    pub fn new(predicate: Predicate) -> Self {
        Self {
            predicate,
            order: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Applies the spec to an in-memory row set
    pub fn apply<E: Entity>(&self, rows: &[E]) -> Vec<E> {
        let mut selected: Vec<E> = rows
            .iter()
            .filter(|row| self.predicate.matches(*row))
            .cloned()
            .collect();

        if !self.order.is_empty() {
            selected.sort_by(|a, b| {
                self.order
                    .iter()
                    .map(|o| {
                        let ord = a.column(o.column).sort_cmp(&b.column(o.column));
                        match o.direction {
                            Direction::Asc => ord,
                            Direction::Desc => ord.reverse(),
                        }
                    })
                    .find(|ord| ord.is_ne())
                    .unwrap_or(Ordering::Equal)
            });
        }

        selected
            .into_iter()
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .collect()
    }
}

/// A persisted row type
pub trait Entity: Clone + Send + Sync + 'static {
    const TABLE: &'static str;

    fn id(&self) -> Uuid;

    /// Value of a named column, `Value::Null` for unknown names
    fn column(&self, name: &str) -> Value;
}

/// Read access to one entity type
#[async_trait]
pub trait Source<T: Entity>: Send + Sync {
    async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<T>, RepositoryError>;

    async fn exists(&self, predicate: &Predicate) -> Result<bool, RepositoryError>;
}

/// A staged write
#[derive(Debug, Clone)]
pub enum Change {
    Insert(Record),
    Update(Record),
}

/// Any persisted row
#[derive(Debug, Clone)]
pub enum Record {
    Submission(Submission),
    Event(SubmissionEvent),
    Error(ValidationError),
    Warning(ValidationWarning),
}

impl Record {
    pub fn table(&self) -> &'static str {
        match self {
            Record::Submission(_) => Submission::TABLE,
            Record::Event(_) => SubmissionEvent::TABLE,
            Record::Error(_) => ValidationError::TABLE,
            Record::Warning(_) => ValidationWarning::TABLE,
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            Record::Submission(r) => r.id,
            Record::Event(r) => r.id,
            Record::Error(r) => r.id,
            Record::Warning(r) => r.id,
        }
    }
}

impl From<Submission> for Record {
    fn from(r: Submission) -> Self {
        Record::Submission(r)
    }
}

impl From<SubmissionEvent> for Record {
    fn from(r: SubmissionEvent) -> Self {
        Record::Event(r)
    }
}

impl From<ValidationError> for Record {
    fn from(r: ValidationError) -> Self {
        Record::Error(r)
    }
}

impl From<ValidationWarning> for Record {
    fn from(r: ValidationWarning) -> Self {
        Record::Warning(r)
    }
}

/// A storage backend
#[async_trait]
pub trait Store:
    Source<Submission> + Source<SubmissionEvent> + Source<ValidationError> + Source<ValidationWarning>
{
    /// Applies a batch atomically and returns the number of affected rows
    async fn commit(&self, changes: Vec<Change>) -> Result<u64, RepositoryError>;

    async fn health_check(&self) -> Result<(), RepositoryError>;
}

pub type SharedStore = Arc<dyn Store>;

async fn cancellable<F, R>(token: &CancellationToken, fut: F) -> Result<R, RepositoryError>
where
    F: Future<Output = Result<R, RepositoryError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(RepositoryError::Cancelled),
        result = fut => result,
    }
}

/// A lazy read; nothing runs until [`Query::to_list`] or [`Query::first`]
pub struct Query<T> {
    store: SharedStore,
    token: CancellationToken,
    spec: QuerySpec,
    entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Query<T>
where
    dyn Store: Source<T>,
{
    pub fn filter(mut self, predicate: Predicate) -> Self {
        let current = std::mem::replace(&mut self.spec.predicate, Predicate::True);
        self.spec.predicate = current.and(predicate);
        self
    }

    pub fn order_by_asc(mut self, column: &'static str) -> Self {
        self.spec.order.push(Order {
            column,
            direction: Direction::Asc,
        });
        self
    }

    pub fn order_by_desc(mut self, column: &'static str) -> Self {
        self.spec.order.push(Order {
            column,
            direction: Direction::Desc,
        });
        self
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.spec.limit = Some(limit);
        self
    }

    pub fn skip(mut self, offset: usize) -> Self {
        self.spec.offset = Some(offset);
        self
    }

    pub fn spec(&self) -> &QuerySpec {
        &self.spec
    }

    pub async fn to_list(self) -> Result<Vec<T>, RepositoryError> {
        let source: &dyn Store = self.store.as_ref();
        cancellable(&self.token, Source::<T>::fetch(source, &self.spec)).await
    }

    pub async fn first(self) -> Result<Option<T>, RepositoryError> {
        let rows = self.take(1).to_list().await?;
        Ok(rows.into_iter().next())
    }
}

/// Read-only repository for one entity type
pub struct QueryRepository<T> {
    store: SharedStore,
    token: CancellationToken,
    entity: PhantomData<fn() -> T>,
}

impl<T> Clone for QueryRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            token: self.token.clone(),
            entity: PhantomData,
        }
    }
}

impl<T: Entity> QueryRepository<T>
where
    dyn Store: Source<T>,
{
    pub fn new(store: SharedStore, token: CancellationToken) -> Self {
        Self {
            store,
            token,
            entity: PhantomData,
        }
    }

    pub fn get_all(&self, predicate: Predicate) -> Query<T> {
        Query {
            store: self.store.clone(),
            token: self.token.clone(),
            spec: QuerySpec::new(predicate),
            entity: PhantomData,
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<Option<T>, RepositoryError> {
        self.get_all(Predicate::eq(col::ID, id)).first().await
    }

    pub async fn any(&self, predicate: Predicate) -> Result<bool, RepositoryError> {
        let source: &dyn Store = self.store.as_ref();
        cancellable(&self.token, Source::<T>::exists(source, &predicate)).await
    }
}

/// Write repository: stage changes, then commit them in one batch
pub struct CommandRepository {
    store: SharedStore,
    token: CancellationToken,
    staged: Vec<Change>,
}

impl CommandRepository {
    pub fn new(store: SharedStore, token: CancellationToken) -> Self {
        Self {
            store,
            token,
            staged: Vec::new(),
        }
    }

    pub fn add(&mut self, record: impl Into<Record>) {
        self.staged.push(Change::Insert(record.into()));
    }

    pub fn update(&mut self, record: impl Into<Record>) {
        self.staged.push(Change::Update(record.into()));
    }

    pub fn staged(&self) -> usize {
        self.staged.len()
    }

    /// Commits everything staged so far; `true` when at least one row was
    /// affected
    pub async fn save_changes(&mut self) -> Result<bool, RepositoryError> {
        if self.staged.is_empty() {
            return Ok(false);
        }
        let changes = std::mem::take(&mut self.staged);
        let rows = cancellable(&self.token, self.store.commit(changes)).await?;
        tracing::debug!(rows, "Saved changes");
        Ok(rows > 0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use epr_common::types::{DataSourceType, SubmissionType};

    fn submission(period: &str, day: u32) -> Submission {
        Submission {
            id: Uuid::new_v4(),
            submission_type: SubmissionType::Producer,
            submission_period: period.to_string(),
            data_source_type: DataSourceType::File,
            organisation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            compliance_scheme_id: None,
            is_submitted: false,
            is_resubmission: false,
            app_reference_number: None,
            created: Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_and_flattens_and_drops_true() {
        let p = Predicate::True
            .and(Predicate::eq(col::ID, Uuid::nil()))
            .and(Predicate::IsNull(col::COMPLIANCE_SCHEME_ID));
        assert!(matches!(&p, Predicate::And(parts) if parts.len() == 2));
        assert_eq!(Predicate::True.and(Predicate::True), Predicate::True);
    }

    #[test]
    fn test_null_comparisons_never_match() {
        let s = submission("2024-P1", 1);
        assert!(!Predicate::eq(col::COMPLIANCE_SCHEME_ID, Value::Null).matches(&s));
        assert!(Predicate::IsNull(col::COMPLIANCE_SCHEME_ID).matches(&s));
    }

    #[test]
    fn test_in_with_empty_list_matches_nothing() {
        let s = submission("2024-P1", 1);
        assert!(!Predicate::is_in::<&str>(col::SUBMISSION_PERIOD, []).matches(&s));
        assert!(Predicate::is_in(col::SUBMISSION_PERIOD, ["x", "2024-P1"]).matches(&s));
    }

    #[test]
    fn test_spec_orders_then_pages() {
        let rows = vec![
            submission("a", 1),
            submission("b", 3),
            submission("c", 2),
        ];
        let mut spec = QuerySpec::new(Predicate::True);
        spec.order.push(Order {
            column: col::CREATED,
            direction: Direction::Desc,
        });
        spec.offset = Some(1);
        spec.limit = Some(1);

        let result = spec.apply(&rows);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].submission_period, "c");
    }
}
