// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use futures::{future::BoxFuture, FutureExt};
use k8s_openapi::{
    api::{
        core::v1::{Secret, Service},
        discovery::v1::EndpointSlice,
        networking::v1::{Ingress, IngressClass},
    },
    NamespaceResourceScope,
};
use kube::{runtime::reflector, Api, Client, Resource};
use tokio::sync::mpsc::{self, Receiver};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

pub mod annotations;
pub mod common;
pub mod configuration;
pub mod controllers;
pub mod crd;
pub mod resolver;
pub mod routing;
pub mod store;

use annotations::AnnotationRegistry;
use configuration::Configuration;
use controllers::{
    mirror, watch_routing_resources, watch_secrets, IngressClassResolver, RoutingEventHandler, RoutingResourceSynchronizer, SecretEventHandler,
    SecretSynchronizer, StoreEvent,
};
use crd::MultiClusterIngress;
use resolver::BackendResolver;
use routing::RoutingObject;
use store::{CertificateStore, EndpointSliceIndex, RoutingStore, SecretReferenceLookup};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Result<T> = std::result::Result<T, Error>;

const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Read-only view handed to whatever renders proxy configuration from the synchronized state.
#[derive(Clone, TypedBuilder)]
pub struct LocalStore {
    pub ingresses: RoutingStore<Ingress>,
    pub multi_cluster_ingresses: RoutingStore<MultiClusterIngress>,
    pub backends: BackendResolver,
    pub certificates: CertificateStore,
}

fn namespaced_api<K>(client: &Client, namespace: Option<&str>) -> Api<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>,
{
    match namespace {
        Some(namespace) => Api::namespaced(client.clone(), namespace),
        None => Api::all(client.clone()),
    }
}

/// Stands in for the render stage: reports every change together with the size of the new snapshot.
async fn log_store_events(mut events: Receiver<StoreEvent>, local_store: LocalStore) {
    while let Some(event) = events.recv().await {
        let ingresses = local_store.ingresses.list().map(|resources| resources.len());
        let multi_cluster_ingresses = local_store.multi_cluster_ingresses.list().map(|resources| resources.len());
        let certificates = local_store.certificates.list().map(|certificates| certificates.len());
        match (ingresses, multi_cluster_ingresses, certificates) {
            (Ok(ingresses), Ok(multi_cluster_ingresses), Ok(certificates)) => {
                info!(
                    "{:?} {} {} ingresses={ingresses} multi_cluster_ingresses={multi_cluster_ingresses} certificates={certificates}",
                    event.kind, event.resource_kind, event.key
                );
            },
            (ingresses, multi_cluster_ingresses, certificates) => {
                warn!("{:?} {} {} snapshot failed {ingresses:?} {multi_cluster_ingresses:?} {certificates:?}", event.kind, event.resource_kind, event.key);
            },
        }
    }
    debug!("Store events channel closed");
}

struct Pipeline<'a> {
    configuration: &'a Configuration,
    client: &'a Client,
    annotations: &'a Arc<AnnotationRegistry>,
    secrets: &'a SecretSynchronizer,
    class_resolver: &'a IngressClassResolver,
    ingress_classes: &'a reflector::Store<IngressClass>,
    events: &'a mpsc::Sender<StoreEvent>,
}

impl Pipeline<'_> {
    fn watch<K>(&self, store: &RoutingStore<K>) -> BoxFuture<'static, ()>
    where
        K: RoutingObject + Resource<DynamicType = (), Scope = NamespaceResourceScope>,
    {
        let synchronizer = RoutingResourceSynchronizer::builder()
            .store(store.clone())
            .annotations(Arc::clone(self.annotations))
            .secrets(self.secrets.clone())
            .denied_words(self.configuration.annotation_value_word_blocklist.clone())
            .events(self.events.clone())
            .build();
        let handler = RoutingEventHandler::builder().class_resolver(self.class_resolver.clone()).synchronizer(Arc::new(synchronizer)).build();
        let api = namespaced_api::<K>(self.client, self.configuration.watch_namespace.as_deref());
        watch_routing_resources(api, self.ingress_classes.clone(), handler).boxed()
    }
}

pub async fn start(configuration: Configuration) -> Result<()> {
    info!("Ingress sync started");
    let client = Client::try_default().await?;
    let namespace = configuration.watch_namespace.as_deref();

    let (services, services_task) = mirror(namespaced_api::<Service>(&client, namespace));
    let (endpoint_slices, endpoint_slices_task) = mirror(namespaced_api::<EndpointSlice>(&client, namespace));
    let (ingress_classes, ingress_classes_task) = mirror(Api::<IngressClass>::all(client.clone()));
    let (secrets, secrets_writer) = reflector::store::<Secret>();

    let secret_synchronizer = SecretSynchronizer::builder().secrets(Arc::new(secrets)).build();
    let annotations = Arc::new(AnnotationRegistry::with_default_parsers(&configuration.annotations_prefix));
    let class_resolver = IngressClassResolver::builder()
        .ingress_classes(Arc::new(ingress_classes.clone()))
        .controller_class(configuration.controller_class.clone())
        .configuration(configuration.ingress_class.clone())
        .build();
    let (events_sender, events_receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

    let local_store = LocalStore::builder()
        .ingresses(RoutingStore::new())
        .multi_cluster_ingresses(RoutingStore::new())
        .backends(
            BackendResolver::builder()
                .services(Arc::new(services))
                .endpoint_slices(EndpointSliceIndex::new(Arc::new(endpoint_slices)))
                .build(),
        )
        .certificates(secret_synchronizer.certificates().clone())
        .build();

    let pipeline = Pipeline {
        configuration: &configuration,
        client: &client,
        annotations: &annotations,
        secrets: &secret_synchronizer,
        class_resolver: &class_resolver,
        ingress_classes: &ingress_classes,
        events: &events_sender,
    };

    let mut references: Vec<Arc<dyn SecretReferenceLookup>> = vec![];
    let mut tasks = vec![services_task, endpoint_slices_task, ingress_classes_task];
    if configuration.watch_ingresses {
        references.push(Arc::new(local_store.ingresses.clone()));
        tasks.push(pipeline.watch(&local_store.ingresses));
    }
    if configuration.watch_multi_cluster_ingresses {
        references.push(Arc::new(local_store.multi_cluster_ingresses.clone()));
        tasks.push(pipeline.watch(&local_store.multi_cluster_ingresses));
    }
    drop(events_sender);

    let secret_handler = SecretEventHandler::builder().secrets(secret_synchronizer.clone()).references(references).build();
    tasks.push(watch_secrets(namespaced_api::<Secret>(&client, namespace), secrets_writer, secret_handler).boxed());
    tasks.push(log_store_events(events_receiver, local_store).boxed());

    futures::future::join_all(tasks).await;
    info!("Ingress sync stopped");
    Ok(())
}
