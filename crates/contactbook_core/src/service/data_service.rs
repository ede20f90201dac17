//! Data-access service over the persisted snapshot.
//!
//! # Responsibility
//! - Provide upsert/query/remove entry points for users and contacts.
//! - Check connectivity eagerly before any store command.
//! - Project storage records into views for read operations.
//!
//! # Invariants
//! - Every operation loads the full snapshot first; mutations store the full
//!   snapshot back before returning.
//! - Validation and referential failures happen before the store-back, so
//!   the stored snapshot is left unchanged.
//! - Under `WritePolicy::LastWriterWins` there is no locking between load and
//!   store: two interleaved writers lose the first writer's change.

use crate::kv::{KvError, KvStore};
use crate::model::dataset::Dataset;
use crate::model::user::{Contact, User, UserId, UserValidationError};
use crate::model::view::{project_users, UserView};
use crate::repo::snapshot_repo::{LoadedSnapshot, RepoError, SnapshotRepository};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// How a mutated snapshot is written back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// Plain SET; a concurrent writer's change may be overwritten.
    #[default]
    LastWriterWins,
    /// Conditional SET against the loaded bytes; interleaved writers get
    /// `ServiceError::Conflict` instead of a silent lost update.
    CompareAndSwap,
}

/// Coarse error category, independent of context fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    NotConnected,
    NotFound,
    Validation,
    Serialization,
    Store,
    Conflict,
}

/// Error returned by `DataService` operations.
///
/// Every variant names the operation that failed.
#[derive(Debug)]
pub enum ServiceError {
    /// No store is attached.
    NotConnected { operation: &'static str },
    /// Requested user, or a contact's owner, is absent from the snapshot.
    UserNotFound {
        operation: &'static str,
        user_id: UserId,
    },
    /// Input rejected before touching the store.
    Validation {
        operation: &'static str,
        source: UserValidationError,
    },
    /// Snapshot could not be decoded or encoded.
    Serialization {
        operation: &'static str,
        source: serde_json::Error,
    },
    /// Store command failed.
    Store {
        operation: &'static str,
        source: KvError,
    },
    /// Snapshot changed between load and store-back.
    Conflict { operation: &'static str },
}

impl ServiceError {
    pub fn kind(&self) -> ServiceErrorKind {
        match self {
            Self::NotConnected { .. } => ServiceErrorKind::NotConnected,
            Self::UserNotFound { .. } => ServiceErrorKind::NotFound,
            Self::Validation { .. } => ServiceErrorKind::Validation,
            Self::Serialization { .. } => ServiceErrorKind::Serialization,
            Self::Store { .. } => ServiceErrorKind::Store,
            Self::Conflict { .. } => ServiceErrorKind::Conflict,
        }
    }

    pub fn operation(&self) -> &'static str {
        match self {
            Self::NotConnected { operation }
            | Self::UserNotFound { operation, .. }
            | Self::Validation { operation, .. }
            | Self::Serialization { operation, .. }
            | Self::Store { operation, .. }
            | Self::Conflict { operation } => *operation,
        }
    }

    fn from_repo(operation: &'static str, err: RepoError) -> Self {
        match err {
            RepoError::Serialization(source) => Self::Serialization { operation, source },
            RepoError::Kv(source) => Self::Store { operation, source },
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotConnected { operation } => {
                write!(f, "{operation}: store connection is not initialized")
            }
            Self::UserNotFound { operation, user_id } => {
                write!(f, "{operation}: user not found: {user_id}")
            }
            Self::Validation { operation, source } => write!(f, "{operation}: {source}"),
            Self::Serialization { operation, source } => {
                write!(f, "{operation}: invalid snapshot document: {source}")
            }
            Self::Store { operation, source } => write!(f, "{operation}: {source}"),
            Self::Conflict { operation } => write!(
                f,
                "{operation}: snapshot was modified concurrently; reload and retry"
            ),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation { source, .. } => Some(source),
            Self::Serialization { source, .. } => Some(source),
            Self::Store { source, .. } => Some(source),
            Self::NotConnected { .. } | Self::UserNotFound { .. } | Self::Conflict { .. } => None,
        }
    }
}

/// Service facade over one key-value session.
///
/// Operations are synchronous and assume exclusive use of the session while
/// they run. The snapshot decoded by one operation is never shared with
/// another.
pub struct DataService<S: KvStore> {
    repo: Option<SnapshotRepository<S>>,
    write_policy: WritePolicy,
}

impl<S: KvStore> DataService<S> {
    /// Creates a service connected to `store`.
    pub fn new(store: S) -> Self {
        Self {
            repo: Some(SnapshotRepository::new(store)),
            write_policy: WritePolicy::default(),
        }
    }

    /// Creates a service with no store attached. Every operation fails with
    /// `ServiceError::NotConnected` until `connect` is called.
    pub fn disconnected() -> Self {
        Self {
            repo: None,
            write_policy: WritePolicy::default(),
        }
    }

    pub fn with_write_policy(mut self, write_policy: WritePolicy) -> Self {
        self.write_policy = write_policy;
        self
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    pub fn is_connected(&self) -> bool {
        self.repo.is_some()
    }

    /// Attaches `store`, returning the previously attached one.
    pub fn connect(&mut self, store: S) -> Option<S> {
        self.repo
            .replace(SnapshotRepository::new(store))
            .map(SnapshotRepository::into_store)
    }

    /// Detaches and returns the current store.
    pub fn disconnect(&mut self) -> Option<S> {
        self.repo.take().map(SnapshotRepository::into_store)
    }

    /// Inserts or fully replaces one user.
    ///
    /// Contacts missing from `user` are dropped from the stored user.
    pub fn upsert_user(&self, user: &User) -> ServiceResult<()> {
        const OP: &str = "upsert_user";
        self.run(OP, || {
            let repo = self.repo(OP)?;
            user.validate()
                .map_err(|source| ServiceError::Validation { operation: OP, source })?;

            let LoadedSnapshot { mut dataset, raw } = load(repo, OP)?;
            let replaced = dataset.upsert_user(user.clone()).is_some();
            self.store_back(repo, OP, &dataset, raw.as_deref())?;

            info!(
                "event=user_upsert module=service status=ok user_id={} contacts={} replaced={}",
                user.id,
                user.contacts.len(),
                replaced
            );
            Ok(())
        })
    }

    /// Inserts or replaces one contact under its existing owner.
    ///
    /// # Errors
    /// - `UserNotFound` when `contact.user_id` is absent; nothing is written.
    pub fn upsert_contact(&self, contact: &Contact) -> ServiceResult<()> {
        const OP: &str = "upsert_contact";
        self.run(OP, || {
            let repo = self.repo(OP)?;
            let LoadedSnapshot { mut dataset, raw } = load(repo, OP)?;
            let replaced = match dataset.upsert_contact(contact.clone()) {
                Ok(previous) => previous.is_some(),
                Err(orphan) => {
                    return Err(ServiceError::UserNotFound {
                        operation: OP,
                        user_id: orphan.user_id,
                    });
                }
            };
            self.store_back(repo, OP, &dataset, raw.as_deref())?;

            info!(
                "event=contact_upsert module=service status=ok contact_id={} user_id={} replaced={}",
                contact.id, contact.user_id, replaced
            );
            Ok(())
        })
    }

    /// Returns the view of one user.
    pub fn get_user_view(&self, id: &str) -> ServiceResult<UserView> {
        const OP: &str = "get_user_view";
        self.run(OP, || {
            let dataset = load(self.repo(OP)?, OP)?.dataset;
            let view = dataset
                .user(id)
                .map(UserView::from)
                .ok_or_else(|| ServiceError::UserNotFound {
                    operation: OP,
                    user_id: id.to_string(),
                })?;

            info!(
                "event=user_view_get module=service status=ok user_id={} contacts={}",
                view.id,
                view.contacts.len()
            );
            Ok(view)
        })
    }

    /// Returns views for every stored user, in unspecified order.
    pub fn list_user_views(&self) -> ServiceResult<Vec<UserView>> {
        const OP: &str = "list_user_views";
        self.run(OP, || {
            let dataset = load(self.repo(OP)?, OP)?.dataset;
            let views = project_users(&dataset);

            info!(
                "event=user_view_list module=service status=ok count={}",
                views.len()
            );
            Ok(views)
        })
    }

    /// Returns the storage record of one user, contacts included.
    pub fn get_user(&self, id: &str) -> ServiceResult<User> {
        const OP: &str = "get_user";
        self.run(OP, || {
            let mut dataset = load(self.repo(OP)?, OP)?.dataset;
            dataset
                .take_user(id)
                .ok_or_else(|| ServiceError::UserNotFound {
                    operation: OP,
                    user_id: id.to_string(),
                })
        })
    }

    /// Deletes the whole snapshot. Succeeds when nothing was stored.
    pub fn remove_all(&self) -> ServiceResult<()> {
        const OP: &str = "remove_all";
        self.run(OP, || {
            let existed = self
                .repo(OP)?
                .remove()
                .map_err(|err| ServiceError::from_repo(OP, err))?;

            warn!("event=snapshot_remove module=service status=ok existed={existed}");
            Ok(())
        })
    }

    fn repo(&self, operation: &'static str) -> ServiceResult<&SnapshotRepository<S>> {
        self.repo
            .as_ref()
            .ok_or(ServiceError::NotConnected { operation })
    }

    fn store_back(
        &self,
        repo: &SnapshotRepository<S>,
        operation: &'static str,
        dataset: &Dataset,
        loaded_raw: Option<&[u8]>,
    ) -> ServiceResult<()> {
        match self.write_policy {
            WritePolicy::LastWriterWins => repo
                .save(dataset)
                .map_err(|err| ServiceError::from_repo(operation, err)),
            WritePolicy::CompareAndSwap => {
                let swapped = repo
                    .save_if_unchanged(dataset, loaded_raw)
                    .map_err(|err| ServiceError::from_repo(operation, err))?;
                if swapped {
                    Ok(())
                } else {
                    Err(ServiceError::Conflict { operation })
                }
            }
        }
    }

    fn run<T, F>(&self, operation: &'static str, body: F) -> ServiceResult<T>
    where
        F: FnOnce() -> ServiceResult<T>,
    {
        let started_at = Instant::now();
        let result = body();
        if let Err(err) = &result {
            error!(
                "event={operation} module=service status=error duration_ms={} error_kind={:?} error={err}",
                started_at.elapsed().as_millis(),
                err.kind()
            );
        }
        result
    }
}

fn load<S: KvStore>(
    repo: &SnapshotRepository<S>,
    operation: &'static str,
) -> ServiceResult<LoadedSnapshot> {
    repo.load()
        .map_err(|err| ServiceError::from_repo(operation, err))
}
