//! File-backed entity store
//!
//! Every operation reads the whole document fresh from disk; every mutation
//! writes the whole document back. Only the `nextId` counter is cached.
//!
//! Operations on one store instance are serialized by an async mutex that
//! also owns the counter, so overlapping calls cannot lose each other's
//! updates. Separate instances pointed at the same file are not coordinated
//! and may issue duplicate ids.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::config::{RecoveryPolicy, StoreConfig};
use super::entity::{EntityId, Identifiable};
use super::errors::{StoreError, StoreResult};
use crate::descriptor::{check, TypeDescriptor};
use crate::document::{self, DocumentError, Revive, StorageDocument};
use crate::observability::StoreEvent;

/// How conforming wire items become `T`.
enum ItemDecoder<T> {
    Deserialize(fn(Value) -> serde_json::Result<T>),
    Revive(Revive<T>),
}

/// Repository of `T` records persisted as one JSON document.
pub struct EntityStore<T> {
    path: PathBuf,
    descriptor: TypeDescriptor,
    decoder: ItemDecoder<T>,
    config: StoreConfig,
    /// Next id to issue. Held for the duration of every operation.
    next_id: Mutex<EntityId>,
}

impl<T> fmt::Debug for EntityStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("path", &self.path)
            .field("descriptor", &self.descriptor)
            .field("revive", &matches!(self.decoder, ItemDecoder::Revive(_)))
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<T: DeserializeOwned> EntityStore<T> {
    /// Creates a store with the default configuration.
    ///
    /// Nothing is read until [`initialize`](Self::initialize) or the first operation.
    pub fn new(path: impl Into<PathBuf>, descriptor: TypeDescriptor) -> StoreResult<Self> {
        Self::with_config(path, descriptor, StoreConfig::default())
    }

    /// Creates a store whose items deserialize straight into `T`.
    /// Fails if `descriptor` is malformed.
    pub fn with_config(
        path: impl Into<PathBuf>,
        descriptor: TypeDescriptor,
        config: StoreConfig,
    ) -> StoreResult<Self> {
        Self::build(
            path.into(),
            descriptor,
            config,
            ItemDecoder::Deserialize(serde_json::from_value::<T>),
        )
    }
}

impl<T> EntityStore<T> {
    /// Creates a store whose items are built only by `revive`.
    ///
    /// `T` need not implement `Deserialize`.
    pub fn with_reviver<F>(
        path: impl Into<PathBuf>,
        descriptor: TypeDescriptor,
        config: StoreConfig,
        revive: F,
    ) -> StoreResult<Self>
    where
        F: Fn(Value) -> T + Send + Sync + 'static,
    {
        Self::build(path.into(), descriptor, config, ItemDecoder::Revive(Arc::new(revive)))
    }

    fn build(
        path: PathBuf,
        descriptor: TypeDescriptor,
        config: StoreConfig,
        decoder: ItemDecoder<T>,
    ) -> StoreResult<Self> {
        descriptor.validate()?;
        Ok(Self {
            path,
            descriptor,
            decoder,
            config,
            next_id: Mutex::new(1),
        })
    }

    /// Installs a transform from validated wire items to `T`.
    pub fn with_revive<F>(mut self, revive: F) -> Self
    where
        F: Fn(Value) -> T + Send + Sync + 'static,
    {
        self.decoder = ItemDecoder::Revive(Arc::new(revive));
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The id the next insert will receive, as far as this instance knows.
    pub async fn next_id(&self) -> EntityId {
        *self.next_id.lock().await
    }
}

impl<T> EntityStore<T>
where
    T: Identifiable + Serialize,
{
    /// Adopts the existing document, or writes a fresh empty one.
    ///
    /// A missing or unreadable file is treated as "no prior store". What
    /// happens to an unreadable file first is governed by
    /// [`RecoveryPolicy`]. Failure to write the fresh document surfaces.
    pub async fn initialize(&self) -> StoreResult<()> {
        let mut next_id = self.next_id.lock().await;

        let err = match self.load().await {
            Ok(doc) => {
                *next_id = doc.next_id;
                info!(
                    target: "shelfdb::store",
                    event = StoreEvent::StoreInitialized.as_str(),
                    path = %self.path.display(),
                    next_id = doc.next_id,
                    items = doc.items.len(),
                    "store initialized"
                );
                return Ok(());
            }
            Err(err) => err,
        };

        let event = if matches!(&err, StoreError::Document(e) if e.is_not_found()) {
            StoreEvent::StoreCreated
        } else if err.is_corruption() {
            match self.config.recovery {
                RecoveryPolicy::Fail => return Err(err),
                RecoveryPolicy::Reset => StoreEvent::StoreRecovered,
                RecoveryPolicy::Backup => {
                    self.back_up().await?;
                    StoreEvent::CorruptBackedUp
                }
            }
        } else if matches!(err, StoreError::Document(DocumentError::Io { .. })) {
            StoreEvent::StoreRecovered
        } else {
            return Err(err);
        };

        self.persist(Vec::new(), 1).await?;
        *next_id = 1;

        if event.is_recovery() {
            warn!(
                target: "shelfdb::store",
                event = event.as_str(),
                path = %self.path.display(),
                error = %err,
                "unreadable document replaced by an empty one"
            );
        } else {
            info!(
                target: "shelfdb::store",
                event = event.as_str(),
                path = %self.path.display(),
                "store created"
            );
        }
        Ok(())
    }

    /// Returns every stored item in insertion order.
    pub async fn get_all(&self) -> StoreResult<Vec<T>> {
        let _guard = self.next_id.lock().await;
        Ok(self.load().await?.items)
    }

    pub async fn get_by_id(&self, id: EntityId) -> StoreResult<T> {
        check_id(id)?;
        let _guard = self.next_id.lock().await;
        self.load()
            .await?
            .items
            .into_iter()
            .find(|item| item.id() == id)
            .ok_or_else(|| self.not_found(id))
    }

    /// Assigns the next id to `value`, appends it and returns the id.
    pub async fn insert(&self, mut value: T) -> StoreResult<EntityId> {
        let mut next_id = self.next_id.lock().await;
        let mut doc = self.load().await?;

        // never fall behind a counter already on disk
        let id = (*next_id).max(doc.next_id);
        let following = id.checked_add(1).ok_or_else(|| StoreError::IdSpaceExhausted {
            path: self.path.clone(),
        })?;

        value.set_id(id);
        if value.id() != id {
            return Err(StoreError::IdRejected { id });
        }
        self.conform(&value)?;

        *next_id = following;
        doc.items.push(value);
        self.persist(doc.items, following).await?;

        debug!(
            target: "shelfdb::store",
            event = StoreEvent::EntityInserted.as_str(),
            path = %self.path.display(),
            id,
            "entity inserted"
        );
        Ok(id)
    }

    /// Replaces the stored item that has `value`'s id.
    pub async fn update(&self, value: T) -> StoreResult<()> {
        let id = value.id();
        check_id(id)?;
        self.conform(&value)?;

        let mut next_id = self.next_id.lock().await;
        let mut doc = self.load().await?;
        *next_id = (*next_id).max(doc.next_id);

        let index = self.position(&doc.items, id)?;
        doc.items[index] = value;
        self.persist(doc.items, *next_id).await?;

        debug!(
            target: "shelfdb::store",
            event = StoreEvent::EntityUpdated.as_str(),
            path = %self.path.display(),
            id,
            "entity updated"
        );
        Ok(())
    }

    /// Removes the stored item with `id`. Its id is never reissued.
    pub async fn delete(&self, id: EntityId) -> StoreResult<()> {
        check_id(id)?;

        let mut next_id = self.next_id.lock().await;
        let mut doc = self.load().await?;
        *next_id = (*next_id).max(doc.next_id);

        let index = self.position(&doc.items, id)?;
        doc.items.remove(index);
        self.persist(doc.items, *next_id).await?;

        debug!(
            target: "shelfdb::store",
            event = StoreEvent::EntityDeleted.as_str(),
            path = %self.path.display(),
            id,
            "entity deleted"
        );
        Ok(())
    }

    async fn load(&self) -> StoreResult<StorageDocument<T>> {
        let doc = match &self.decoder {
            ItemDecoder::Deserialize(from_value) => {
                document::read_with(&self.path, &self.descriptor, *from_value).await?
            }
            ItemDecoder::Revive(revive) => {
                document::read_with(&self.path, &self.descriptor, |item| Ok(revive(item))).await?
            }
        };
        if self.config.verify_invariants {
            self.verify(&doc)?;
        }
        Ok(doc)
    }

    async fn persist(&self, items: Vec<T>, next_id: EntityId) -> StoreResult<()> {
        let doc = StorageDocument::new(next_id, items);
        document::write(&self.path, &doc, &self.config.write_options()).await?;
        Ok(())
    }

    /// Rejects a value whose written form the next read would refuse.
    fn conform(&self, value: &T) -> StoreResult<()> {
        let wire = serde_json::to_value(value).map_err(DocumentError::Serialize)?;
        match check(Some(&wire), &self.descriptor)? {
            Some(mismatch) => Err(StoreError::Nonconforming { mismatch }),
            None => Ok(()),
        }
    }

    /// Moves the unreadable document aside.
    async fn back_up(&self) -> StoreResult<()> {
        let backup = backup_path(&self.path);
        tokio::fs::rename(&self.path, &backup)
            .await
            .map_err(|e| DocumentError::io(&self.path, e))?;
        warn!(
            target: "shelfdb::store",
            event = StoreEvent::CorruptBackedUp.as_str(),
            path = %self.path.display(),
            backup = %backup.display(),
            "unreadable document moved aside"
        );
        Ok(())
    }

    /// Ids are positive, unique, and below `nextId`.
    fn verify(&self, doc: &StorageDocument<T>) -> StoreResult<()> {
        let mut seen = HashSet::with_capacity(doc.items.len());
        for (index, item) in doc.items.iter().enumerate() {
            let id = item.id();
            let reason = if id == 0 {
                format!("item {} has non-positive id", index)
            } else if !seen.insert(id) {
                format!("id {} appears more than once", id)
            } else if id >= doc.next_id {
                format!("id {} is not below nextId {}", id, doc.next_id)
            } else {
                continue;
            };
            return Err(StoreError::InvariantViolation {
                path: self.path.clone(),
                reason,
            });
        }
        Ok(())
    }

    fn position(&self, items: &[T], id: EntityId) -> StoreResult<usize> {
        items
            .iter()
            .position(|item| item.id() == id)
            .ok_or_else(|| self.not_found(id))
    }

    fn not_found(&self, id: EntityId) -> StoreError {
        StoreError::EntityNotFound {
            id,
            path: self.path.clone(),
        }
    }
}

fn check_id(id: EntityId) -> StoreResult<()> {
    if id == 0 {
        return Err(StoreError::InvalidId(id));
    }
    Ok(())
}

/// `<file>.corrupt-<UTC timestamp>` next to the original
fn backup_path(path: &Path) -> PathBuf {
    let stamp = chrono::Utc::now().format("%Y%m%dT%H%M%S%.3fZ");
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    path.with_file_name(format!("{}.corrupt-{}", name, stamp))
}
