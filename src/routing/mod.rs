// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

//! Routing resources: the object kinds that carry host/path rules (`Ingress` and
//! `MultiClusterIngress`) and the enriched form kept in the local cache.

use k8s_openapi::{
    api::networking::v1::{Ingress, IngressRule, IngressTLS},
    chrono::{DateTime, Utc},
};
use kube::Resource;
use serde::de::DeserializeOwned;

use crate::{annotations::ParsedAnnotations, common::ResourceKey, crd::MultiClusterIngress};

pub const DEFAULT_PATH: &str = "/";
pub const PATH_TYPE_PREFIX: &str = "Prefix";
pub const PATH_TYPE_IMPLEMENTATION_SPECIFIC: &str = "ImplementationSpecific";

pub trait RoutingObject:
    Resource<DynamicType = ()> + DeserializeOwned + Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    fn ingress_class_name(&self) -> Option<&str>;
    fn rules(&self) -> &[IngressRule];
    fn rules_mut(&mut self) -> Option<&mut Vec<IngressRule>>;
    fn tls(&self) -> &[IngressTLS];
}

impl RoutingObject for Ingress {
    fn ingress_class_name(&self) -> Option<&str> {
        self.spec.as_ref().and_then(|spec| spec.ingress_class_name.as_deref())
    }

    fn rules(&self) -> &[IngressRule] {
        self.spec.as_ref().and_then(|spec| spec.rules.as_deref()).unwrap_or_default()
    }

    fn rules_mut(&mut self) -> Option<&mut Vec<IngressRule>> {
        self.spec.as_mut().and_then(|spec| spec.rules.as_mut())
    }

    fn tls(&self) -> &[IngressTLS] {
        self.spec.as_ref().and_then(|spec| spec.tls.as_deref()).unwrap_or_default()
    }
}

impl RoutingObject for MultiClusterIngress {
    fn ingress_class_name(&self) -> Option<&str> {
        self.spec.ingress_class_name.as_deref()
    }

    fn rules(&self) -> &[IngressRule] {
        self.spec.rules.as_deref().unwrap_or_default()
    }

    fn rules_mut(&mut self) -> Option<&mut Vec<IngressRule>> {
        self.spec.rules.as_mut()
    }

    fn tls(&self) -> &[IngressTLS] {
        self.spec.tls.as_deref().unwrap_or_default()
    }
}

/// Returns an owned copy of `object` with every HTTP path given a path and a concrete path type.
///
/// Objects handed out by the watch mirror are shared, so the input is never modified.
pub fn normalize<K: RoutingObject>(object: &K) -> K {
    let mut copy = object.clone();
    let Some(rules) = copy.rules_mut() else {
        return copy;
    };

    for http in rules.iter_mut().filter_map(|rule| rule.http.as_mut()) {
        for path in &mut http.paths {
            if path.path.as_deref().map_or(true, str::is_empty) {
                path.path = Some(DEFAULT_PATH.to_owned());
            }
            if path.path_type.is_empty() || path.path_type == PATH_TYPE_IMPLEMENTATION_SPECIFIC {
                path.path_type = PATH_TYPE_PREFIX.to_owned();
            }
        }
    }
    copy
}

/// The cached, annotation-enriched form of a routing object.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutingResource<K> {
    key: ResourceKey,
    object: K,
    parsed_annotations: ParsedAnnotations,
}

impl<K: RoutingObject> RoutingResource<K> {
    pub fn new(object: K, parsed_annotations: ParsedAnnotations) -> Self {
        Self { key: ResourceKey::from_resource(&object), object, parsed_annotations }
    }

    pub fn key(&self) -> &ResourceKey {
        &self.key
    }

    pub fn object(&self) -> &K {
        &self.object
    }

    pub fn parsed_annotations(&self) -> &ParsedAnnotations {
        &self.parsed_annotations
    }

    pub fn creation_timestamp(&self) -> Option<DateTime<Utc>> {
        self.object.meta().creation_timestamp.as_ref().map(|time| time.0)
    }
}
