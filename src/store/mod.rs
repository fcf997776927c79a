// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod certificates;
mod endpoint_slices;
mod listing;
mod object_lister;
mod secret_references;

use std::{
    collections::{BTreeSet, HashMap},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, RwLock, RwLockReadGuard, RwLockWriteGuard,
    },
};

pub use certificates::{CertificateStore, SslCertificate};
pub use endpoint_slices::{EndpointSliceIndex, LABEL_SERVICE_NAME};
pub use object_lister::ObjectLister;
pub use secret_references::{collect_secret_references, SecretReferenceIndex, SECRET_REFERENCE_ANNOTATIONS};
use tracing::debug;

use crate::{
    common::ResourceKey,
    routing::{RoutingObject, RoutingResource},
};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("store lock is poisoned")]
    LockingError,
    #[error("{0} does not exist")]
    NotExists(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommitOutcome {
    Created,
    Updated,
    Unchanged,
    Deleted,
    Superseded,
}

/// Anything that can say whether a secret is still needed by some routing resource.
pub trait SecretReferenceLookup: Send + Sync {
    fn is_referenced(&self, secret: &ResourceKey) -> bool;
    fn referencing(&self, secret: &ResourceKey) -> Vec<ResourceKey>;
}

struct Inner<K> {
    resources: HashMap<ResourceKey, Arc<RoutingResource<K>>>,
    secret_references: SecretReferenceIndex,
    applied_sequences: HashMap<ResourceKey, u64>,
}

impl<K> Default for Inner<K> {
    fn default() -> Self {
        Self { resources: HashMap::new(), secret_references: SecretReferenceIndex::default(), applied_sequences: HashMap::new() }
    }
}

impl<K> Inner<K> {
    fn is_superseded(&self, key: &ResourceKey, sequence: u64) -> bool {
        self.applied_sequences.get(key).is_some_and(|applied| *applied > sequence)
    }
}

/// Local cache of enriched routing resources of one kind together with the secrets they reference.
///
/// A resource and its secret references are always replaced under the same write lock so readers
/// never see one without the other.
pub struct RoutingStore<K> {
    inner: Arc<RwLock<Inner<K>>>,
    sequence: Arc<AtomicU64>,
}

impl<K> Clone for RoutingStore<K> {
    fn clone(&self) -> Self {
        Self { inner: Arc::clone(&self.inner), sequence: Arc::clone(&self.sequence) }
    }
}

impl<K> Default for RoutingStore<K> {
    fn default() -> Self {
        Self { inner: Arc::new(RwLock::new(Inner::default())), sequence: Arc::new(AtomicU64::new(0)) }
    }
}

impl<K: RoutingObject> RoutingStore<K> {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner<K>>, StorageError> {
        self.inner.read().map_err(|_| StorageError::LockingError)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner<K>>, StorageError> {
        self.inner.write().map_err(|_| StorageError::LockingError)
    }

    /// Takes a sequence number for an event that just arrived. Later events get larger numbers.
    pub fn next_sequence(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn commit(&self, sequence: u64, resource: RoutingResource<K>, secrets: BTreeSet<ResourceKey>) -> Result<CommitOutcome, StorageError> {
        let key = resource.key().clone();
        let mut inner = self.write()?;
        if inner.is_superseded(&key, sequence) {
            debug!("{key} commit with sequence {sequence} superseded");
            return Ok(CommitOutcome::Superseded);
        }
        inner.applied_sequences.insert(key.clone(), sequence);
        inner.secret_references.replace(key.clone(), secrets);

        let outcome = match inner.resources.get(&key) {
            Some(existing) if **existing == resource => CommitOutcome::Unchanged,
            Some(_) => CommitOutcome::Updated,
            None => CommitOutcome::Created,
        };
        if outcome != CommitOutcome::Unchanged {
            inner.resources.insert(key, Arc::new(resource));
        }
        Ok(outcome)
    }

    /// Removes the resource and its secret references. The applied sequence is kept so that a late
    /// commit for an older event cannot resurrect the resource.
    pub fn remove(&self, sequence: u64, key: &ResourceKey) -> Result<CommitOutcome, StorageError> {
        let mut inner = self.write()?;
        if inner.is_superseded(key, sequence) {
            debug!("{key} removal with sequence {sequence} superseded");
            return Ok(CommitOutcome::Superseded);
        }
        inner.applied_sequences.insert(key.clone(), sequence);
        inner.secret_references.delete(key);
        Ok(match inner.resources.remove(key) {
            Some(_) => CommitOutcome::Deleted,
            None => CommitOutcome::Unchanged,
        })
    }

    pub fn by_key(&self, key: &ResourceKey) -> Result<Arc<RoutingResource<K>>, StorageError> {
        self.read()?.resources.get(key).cloned().ok_or_else(|| StorageError::NotExists(key.to_string()))
    }

    pub fn referenced_secrets(&self, key: &ResourceKey) -> Result<Vec<ResourceKey>, StorageError> {
        Ok(self.read()?.secret_references.referenced_by(key))
    }

    fn snapshot(&self) -> Result<Vec<Arc<RoutingResource<K>>>, StorageError> {
        Ok(self.read()?.resources.values().cloned().collect())
    }
}

impl<K: RoutingObject> SecretReferenceLookup for RoutingStore<K> {
    fn is_referenced(&self, secret: &ResourceKey) -> bool {
        self.read().is_ok_and(|inner| inner.secret_references.is_referenced(secret))
    }

    fn referencing(&self, secret: &ResourceKey) -> Vec<ResourceKey> {
        self.read().map(|inner| inner.secret_references.referencers_of(secret)).unwrap_or_default()
    }
}
