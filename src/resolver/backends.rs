// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use k8s_openapi::api::{
    core::v1::{Service, ServicePort},
    networking::v1::IngressServiceBackend,
};
use tracing::debug;
use typed_builder::TypedBuilder;

use super::{resolve_endpoints, BackendEndpoint, Protocol};
use crate::{
    common::ResourceKey,
    store::{EndpointSliceIndex, ObjectLister},
};

/// Resolves the service backends named by routing rules against the local mirrors.
#[derive(Clone, TypedBuilder)]
pub struct BackendResolver {
    services: Arc<dyn ObjectLister<Service>>,
    endpoint_slices: EndpointSliceIndex,
}

fn find_service_port<'a>(service: &'a Service, backend: &IngressServiceBackend) -> Option<&'a ServicePort> {
    let backend_port = backend.port.as_ref()?;
    let ports = service.spec.as_ref()?.ports.as_deref()?;
    match (backend_port.number, backend_port.name.as_deref()) {
        (Some(number), _) if number > 0 => ports.iter().find(|port| port.port == number),
        (_, Some(name)) if !name.is_empty() => ports.iter().find(|port| port.name.as_deref() == Some(name)),
        _ => None,
    }
}

impl BackendResolver {
    /// Endpoints for a backend of a routing resource living in `namespace`. A service or port that
    /// can't be found yet resolves to no endpoints.
    pub fn resolve(&self, namespace: &str, backend: &IngressServiceBackend, protocol: Protocol) -> Vec<BackendEndpoint> {
        let key = ResourceKey::namespaced(&backend.name, namespace);
        let Some(service) = self.services.get_by_key(&key) else {
            debug!("Service {key} not found");
            return vec![];
        };
        let service_port = find_service_port(&service, backend);
        if service_port.is_none() {
            debug!("Service {key} has no port matching {:?}", backend.port);
        }
        resolve_endpoints(Some(&service), service_port, protocol, |key| self.endpoint_slices.by_key(key))
    }
}
