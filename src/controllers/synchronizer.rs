// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::BTreeMap, sync::Arc};

use kube::ResourceExt;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use super::SecretSynchronizer;
use crate::{
    annotations::{AnnotationError, AnnotationRegistry},
    common::ResourceKey,
    routing::{normalize, RoutingObject, RoutingResource},
    store::{collect_secret_references, CommitOutcome, RoutingStore, StorageError},
};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("annotation {annotation} contains denied word {word}")]
    DeniedAnnotationValue { annotation: String, word: String },
    #[error(transparent)]
    InvalidAnnotation(#[from] AnnotationError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreEventKind {
    Created,
    Updated,
    Deleted,
}

/// Emitted after the cache changed, so the render stage knows a new snapshot is worth taking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreEvent {
    pub kind: StoreEventKind,
    pub resource_kind: String,
    pub key: ResourceKey,
}

fn check_denied_words(annotations: &BTreeMap<String, String>, denied_words: &[String]) -> Result<(), SyncError> {
    for (annotation, value) in annotations {
        if let Some(word) = denied_words.iter().find(|word| value.contains(word.as_str())) {
            return Err(SyncError::DeniedAnnotationValue { annotation: annotation.clone(), word: word.clone() });
        }
    }
    Ok(())
}

/// Brings the cached, enriched copy of one routing resource kind in line with watch events.
#[derive(TypedBuilder)]
pub struct RoutingResourceSynchronizer<K> {
    store: RoutingStore<K>,
    annotations: Arc<AnnotationRegistry>,
    secrets: SecretSynchronizer,
    #[builder(default)]
    denied_words: Vec<String>,
    #[builder(default, setter(strip_option))]
    events: Option<mpsc::Sender<StoreEvent>>,
}

impl<K: RoutingObject> RoutingResourceSynchronizer<K> {
    pub fn store(&self) -> &RoutingStore<K> {
        &self.store
    }

    /// Normalizes, annotates and commits `object`. Any error leaves the previously cached version
    /// in place.
    pub async fn sync(&self, object: &K) -> Result<CommitOutcome, SyncError> {
        let sequence = self.store.next_sequence();
        let key = ResourceKey::from_resource(object);
        let kind = K::kind(&());
        debug!("{kind} {key} synchronizing with sequence {sequence}");

        if let Err(e) = check_denied_words(object.annotations(), &self.denied_words) {
            warn!("{kind} {key} skipped {e}");
            return Err(e);
        }

        let normalized = normalize(object);
        let parsed_annotations = match self.annotations.extract(normalized.meta()) {
            Ok(parsed_annotations) => parsed_annotations,
            Err(e) => {
                warn!("{kind} {key} skipped {e}");
                return Err(e.into());
            },
        };
        let secrets = collect_secret_references(&normalized, &self.annotations.reader(normalized.meta()));

        let outcome = self.store.commit(sequence, RoutingResource::new(normalized, parsed_annotations), secrets)?;
        debug!("{kind} {key} commit {outcome:?}");
        match outcome {
            CommitOutcome::Superseded => return Ok(outcome),
            CommitOutcome::Created => self.notify(StoreEventKind::Created, key.clone()).await,
            CommitOutcome::Updated => self.notify(StoreEventKind::Updated, key.clone()).await,
            CommitOutcome::Unchanged | CommitOutcome::Deleted => (),
        }
        self.sync_dependents(&key)?;
        Ok(outcome)
    }

    pub async fn delete(&self, key: &ResourceKey) -> Result<CommitOutcome, SyncError> {
        let sequence = self.store.next_sequence();
        let outcome = self.store.remove(sequence, key)?;
        debug!("{} {key} delete {outcome:?}", K::kind(&()));
        if outcome == CommitOutcome::Deleted {
            self.notify(StoreEventKind::Deleted, key.clone()).await;
        }
        Ok(outcome)
    }

    /// Re-reads every secret `key` currently references. This is what picks up a secret created
    /// after the resource pointing at it.
    pub fn sync_dependents(&self, key: &ResourceKey) -> Result<(), SyncError> {
        for secret in self.store.referenced_secrets(key)? {
            self.secrets.sync_secret(&secret)?;
        }
        Ok(())
    }

    async fn notify(&self, kind: StoreEventKind, key: ResourceKey) {
        if let Some(events) = &self.events {
            let event = StoreEvent { kind, resource_kind: K::kind(&()).to_string(), key };
            if let Err(e) = events.send(event).await {
                debug!("Store event not delivered {e}");
            }
        }
    }
}
