// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::BTreeSet, fmt::Debug, sync::Arc};

use futures::{future::BoxFuture, FutureExt, StreamExt};
use k8s_openapi::api::{core::v1::Secret, networking::v1::IngressClass};
use kube::{
    runtime::{
        reflector::{self, store::Writer, Store},
        watcher, WatchStreamExt,
    },
    Api, Resource,
};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use super::{IngressClassResolver, RoutingResourceSynchronizer, SecretSynchronizer};
use crate::{common::ResourceKey, routing::RoutingObject, store::SecretReferenceLookup};

/// Starts a local mirror of `api`. The returned task keeps the mirror current and must be polled.
pub fn mirror<K>(api: Api<K>) -> (Store<K>, BoxFuture<'static, ()>)
where
    K: Resource<DynamicType = ()> + Clone + DeserializeOwned + Debug + Send + Sync + 'static,
{
    let (reader, writer) = reflector::store();
    let kind = K::kind(&()).to_string();
    let task = watcher(api, watcher::Config::default())
        .default_backoff()
        .reflect(writer)
        .for_each(move |event| {
            if let Err(e) = event {
                warn!("{kind} watch failed {e}");
            }
            futures::future::ready(())
        })
        .boxed();
    (reader, task)
}

/// Feeds admitted routing resources of one kind into their synchronizer.
#[derive(TypedBuilder)]
pub struct RoutingEventHandler<K> {
    class_resolver: IngressClassResolver,
    synchronizer: Arc<RoutingResourceSynchronizer<K>>,
    #[builder(default, setter(skip))]
    relisted: Option<BTreeSet<ResourceKey>>,
}

impl<K: RoutingObject> RoutingEventHandler<K> {
    pub async fn handle(&mut self, event: watcher::Event<K>) {
        match event {
            watcher::Event::Init => self.relisted = Some(BTreeSet::new()),
            watcher::Event::InitApply(object) => {
                if let Some(relisted) = self.relisted.as_mut() {
                    relisted.insert(ResourceKey::from_resource(&object));
                }
                self.reconcile(&object).await;
            },
            watcher::Event::Apply(object) => self.reconcile(&object).await,
            watcher::Event::Delete(object) => self.delete(&ResourceKey::from_resource(&object)).await,
            watcher::Event::InitDone => {
                if let Some(relisted) = self.relisted.take() {
                    self.forget_missing(&relisted).await;
                }
            },
        }
    }

    async fn reconcile(&self, object: &K) {
        let key = ResourceKey::from_resource(object);
        let kind = K::kind(&());
        match self.class_resolver.admit(object) {
            Ok(class) => {
                debug!("{kind} {key} admitted with class {}", class.name());
                if let Err(e) = self.synchronizer.sync(object).await {
                    warn!("{kind} {key} not synchronized {e}");
                }
            },
            Err(e) => {
                debug!("{kind} {key} ignored {e}");
                if self.synchronizer.store().by_key(&key).is_ok() {
                    self.delete(&key).await;
                }
            },
        }
    }

    async fn delete(&self, key: &ResourceKey) {
        if let Err(e) = self.synchronizer.delete(key).await {
            warn!("{} {key} not deleted {e}", K::kind(&()));
        }
    }

    /// Objects deleted while the watch was down never produce a delete event.
    async fn forget_missing(&self, relisted: &BTreeSet<ResourceKey>) {
        let cached = match self.synchronizer.store().list() {
            Ok(cached) => cached,
            Err(e) => {
                warn!("{} relist not applied {e}", K::kind(&()));
                return;
            },
        };
        for resource in cached.iter().filter(|resource| !relisted.contains(resource.key())) {
            self.delete(resource.key()).await;
        }
    }
}

pub async fn watch_routing_resources<K>(api: Api<K>, ingress_classes: Store<IngressClass>, mut handler: RoutingEventHandler<K>)
where
    K: RoutingObject,
{
    let kind = K::kind(&()).to_string();
    if let Err(e) = ingress_classes.wait_until_ready().await {
        warn!("{kind} watch not started {e}");
        return;
    }
    info!("{kind} watch...started");
    let mut events = watcher(api, watcher::Config::default()).default_backoff().boxed();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => handler.handle(event).await,
            Err(e) => warn!("{kind} watch failed {e}"),
        }
    }
    info!("{kind} watch...stopped");
}

/// Re-synchronizes secrets that routing resources depend on as they change.
#[derive(Clone, TypedBuilder)]
pub struct SecretEventHandler {
    secrets: SecretSynchronizer,
    references: Vec<Arc<dyn SecretReferenceLookup>>,
    #[builder(default, setter(skip))]
    relisted: Option<BTreeSet<ResourceKey>>,
}

impl SecretEventHandler {
    /// Must be called after `event` was applied to the secrets mirror. Objects of a relist only
    /// become visible in the mirror at `InitDone`, so they are synchronized then.
    pub fn handle(&mut self, event: &watcher::Event<Secret>) {
        match event {
            watcher::Event::Init => self.relisted = Some(BTreeSet::new()),
            watcher::Event::InitApply(secret) => {
                self.relisted.get_or_insert_with(BTreeSet::new).insert(ResourceKey::from_resource(secret));
            },
            watcher::Event::InitDone => {
                if let Some(relisted) = self.relisted.take() {
                    self.apply_relist(&relisted);
                }
            },
            watcher::Event::Apply(secret) => self.refresh(&ResourceKey::from_resource(secret)),
            watcher::Event::Delete(secret) => self.remove(&ResourceKey::from_resource(secret)),
        }
    }

    fn is_referenced(&self, key: &ResourceKey) -> bool {
        self.references.iter().any(|references| references.is_referenced(key))
    }

    /// Secrets nobody points at any more are dropped from the certificate store.
    fn refresh(&self, key: &ResourceKey) {
        if !self.is_referenced(key) {
            self.remove(key);
            return;
        }
        debug!("Secret {key} referenced by {:?}", self.references.iter().flat_map(|references| references.referencing(key)).collect::<Vec<_>>());
        if let Err(e) = self.secrets.sync_secret(key) {
            warn!("Secret {key} not synchronized {e}");
        }
    }

    fn remove(&self, key: &ResourceKey) {
        if let Err(e) = self.secrets.remove_secret(key) {
            warn!("Secret {key} not removed {e}");
        }
    }

    fn apply_relist(&self, relisted: &BTreeSet<ResourceKey>) {
        match self.secrets.certificates().list() {
            Ok(certificates) => {
                for certificate in certificates.iter().filter(|certificate| !relisted.contains(&certificate.secret)) {
                    self.remove(&certificate.secret);
                }
            },
            Err(e) => warn!("Secret relist not applied {e}"),
        }
        for key in relisted {
            self.refresh(key);
        }
    }
}

/// Secrets are mirrored by the same stream that drives the handler, so the mirror is already up to
/// date when an event is handled.
pub async fn watch_secrets(api: Api<Secret>, writer: Writer<Secret>, mut handler: SecretEventHandler) {
    info!("Secret watch...started");
    let mut events = watcher(api, watcher::Config::default()).default_backoff().reflect(writer).boxed();
    while let Some(event) = events.next().await {
        match event {
            Ok(event) => handler.handle(&event),
            Err(e) => warn!("Secret watch failed {e}"),
        }
    }
    info!("Secret watch...stopped");
}
