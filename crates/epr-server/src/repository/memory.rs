//! In-memory store
//!
//! Used by the test suite and for local runs without a database. A batch is
//! checked completely before anything is applied, so a failing commit leaves
//! the tables untouched.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Change, Entity, Predicate, QuerySpec, Record, RepositoryError, Source, Store};
use crate::models::{Submission, SubmissionEvent, ValidationError, ValidationWarning};

#[derive(Default)]
struct Tables {
    submissions: Vec<Submission>,
    events: Vec<SubmissionEvent>,
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

trait InTables: Entity {
    fn rows(tables: &Tables) -> &Vec<Self>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;
}

impl InTables for Submission {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.submissions
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.submissions
    }
}

impl InTables for SubmissionEvent {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.events
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.events
    }
}

impl InTables for ValidationError {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.errors
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.errors
    }
}

impl InTables for ValidationWarning {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.warnings
    }

    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.warnings
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

macro_rules! memory_source {
    ($($entity:ty),+ $(,)?) => {$(
        #[async_trait]
        impl Source<$entity> for MemoryStore {
            async fn fetch(&self, spec: &QuerySpec) -> Result<Vec<$entity>, RepositoryError> {
                let tables = self.tables.read().await;
                Ok(spec.apply(<$entity as InTables>::rows(&tables)))
            }

            async fn exists(&self, predicate: &Predicate) -> Result<bool, RepositoryError> {
                let tables = self.tables.read().await;
                Ok(<$entity as InTables>::rows(&tables)
                    .iter()
                    .any(|row| predicate.matches(row)))
            }
        }
    )+};
}

memory_source!(Submission, SubmissionEvent, ValidationError, ValidationWarning);

/// Ids visible to a batch: stored rows plus rows inserted earlier in the batch
struct BatchIds<'a> {
    tables: &'a Tables,
    inserted: HashSet<(&'static str, Uuid)>,
}

impl BatchIds<'_> {
    fn contains<T: InTables>(&self, id: Uuid) -> bool {
        self.inserted.contains(&(T::TABLE, id)) || T::rows(self.tables).iter().any(|r| r.id() == id)
    }

    fn require<T: InTables>(
        &self,
        table: &'static str,
        column: &'static str,
        id: Uuid,
    ) -> Result<(), RepositoryError> {
        if self.contains::<T>(id) {
            Ok(())
        } else {
            Err(RepositoryError::ForeignKey { table, column, id })
        }
    }

    fn check_insert(&mut self, record: &Record) -> Result<(), RepositoryError> {
        let id = record.id();
        let duplicate = match record {
            Record::Submission(_) => self.contains::<Submission>(id),
            Record::Event(e) => {
                self.require::<Submission>(record.table(), "submission_id", e.submission_id)?;
                self.contains::<SubmissionEvent>(id)
            },
            Record::Error(e) => {
                self.require::<SubmissionEvent>(
                    record.table(),
                    "validation_event_id",
                    e.validation_event_id,
                )?;
                self.contains::<ValidationError>(id)
            },
            Record::Warning(w) => {
                self.require::<SubmissionEvent>(
                    record.table(),
                    "validation_event_id",
                    w.validation_event_id,
                )?;
                self.contains::<ValidationWarning>(id)
            },
        };

        if duplicate {
            return Err(RepositoryError::Conflict {
                table: record.table(),
                id,
            });
        }
        self.inserted.insert((record.table(), id));
        Ok(())
    }
}

fn insert<T: InTables>(tables: &mut Tables, row: T) -> u64 {
    T::rows_mut(tables).push(row);
    1
}

fn update<T: InTables>(tables: &mut Tables, row: T) -> u64 {
    match T::rows_mut(tables).iter_mut().find(|r| r.id() == row.id()) {
        Some(slot) => {
            *slot = row;
            1
        },
        None => 0,
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(&self, changes: Vec<Change>) -> Result<u64, RepositoryError> {
        let mut tables = self.tables.write().await;

        let mut ids = BatchIds {
            tables: &*tables,
            inserted: HashSet::new(),
        };
        for change in &changes {
            if let Change::Insert(record) = change {
                ids.check_insert(record)?;
            }
        }

        let mut rows = 0;
        for change in changes {
            rows += match change {
                Change::Insert(Record::Submission(r)) => insert(&mut tables, r),
                Change::Insert(Record::Event(r)) => insert(&mut tables, r),
                Change::Insert(Record::Error(r)) => insert(&mut tables, r),
                Change::Insert(Record::Warning(r)) => insert(&mut tables, r),
                Change::Update(Record::Submission(r)) => update(&mut tables, r),
                Change::Update(Record::Event(r)) => update(&mut tables, r),
                Change::Update(Record::Error(r)) => update(&mut tables, r),
                Change::Update(Record::Warning(r)) => update(&mut tables, r),
            };
        }
        Ok(rows)
    }

    async fn health_check(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{EventKind, Submitted};
    use chrono::Utc;
    use epr_common::types::{DataSourceType, SubmissionType};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    use crate::repository::{col, CommandRepository, QueryRepository, SharedStore};

    fn submission() -> Submission {
        Submission {
            id: Uuid::new_v4(),
            submission_type: SubmissionType::Registration,
            submission_period: "2024-P2".to_string(),
            data_source_type: DataSourceType::File,
            organisation_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            compliance_scheme_id: None,
            is_submitted: false,
            is_resubmission: false,
            app_reference_number: None,
            created: Utc::now(),
        }
    }

    fn submitted_event(submission_id: Uuid) -> SubmissionEvent {
        SubmissionEvent::new(
            submission_id,
            Uuid::new_v4(),
            EventKind::Submitted(Submitted {
                file_id: Uuid::new_v4(),
                submitted_by: None,
            }),
        )
    }

    fn store() -> SharedStore {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn test_save_changes_persists_batch() {
        let store = store();
        let token = CancellationToken::new();
        let s = submission();

        let mut commands = CommandRepository::new(store.clone(), token.clone());
        commands.add(s.clone());
        commands.add(submitted_event(s.id));
        assert!(commands.save_changes().await.unwrap());

        let submissions = QueryRepository::<Submission>::new(store.clone(), token.clone());
        assert_eq!(submissions.get_by_id(s.id).await.unwrap(), Some(s.clone()));

        let events = QueryRepository::<SubmissionEvent>::new(store, token);
        assert!(events
            .any(Predicate::eq(col::SUBMISSION_ID, s.id))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_failed_batch_leaves_tables_untouched() {
        let store = store();
        let token = CancellationToken::new();
        let s = submission();

        let mut commands = CommandRepository::new(store.clone(), token.clone());
        commands.add(s.clone());
        commands.add(submitted_event(Uuid::new_v4()));
        let err = commands.save_changes().await.unwrap_err();
        assert!(matches!(err, RepositoryError::ForeignKey { .. }));

        let submissions = QueryRepository::<Submission>::new(store, token);
        assert!(submissions.get_by_id(s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_conflicts() {
        let store = store();
        let token = CancellationToken::new();
        let s = submission();

        let mut commands = CommandRepository::new(store.clone(), token.clone());
        commands.add(s.clone());
        commands.add(s);
        assert!(matches!(
            commands.save_changes().await,
            Err(RepositoryError::Conflict { table: "submissions", .. })
        ));
    }

    #[tokio::test]
    async fn test_update_of_missing_row_affects_nothing() {
        let mut commands = CommandRepository::new(store(), CancellationToken::new());
        commands.update(submission());
        assert!(!commands.save_changes().await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_batch_saves_nothing() {
        let mut commands = CommandRepository::new(store(), CancellationToken::new());
        assert!(!commands.save_changes().await.unwrap());
    }

    #[tokio::test]
    async fn test_cancelled_token_aborts_reads() {
        let token = CancellationToken::new();
        token.cancel();
        let submissions = QueryRepository::<Submission>::new(store(), token);
        assert!(matches!(
            submissions.get_all(Predicate::True).to_list().await,
            Err(RepositoryError::Cancelled)
        ));
    }
}
