// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::{BTreeMap, BTreeSet};

use kube::ResourceExt;
use tracing::error;

use crate::{annotations::AnnotationReader, common::ResourceKey, routing::RoutingObject};

/// Annotations whose value names a secret, either `name` or `namespace/name`.
pub const SECRET_REFERENCE_ANNOTATIONS: [&str; 4] = ["auth-secret", "auth-tls-secret", "proxy-ssl-secret", "secure-verify-ca-secret"];

/// Routing resource key -> secret keys it currently references.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SecretReferenceIndex {
    references: BTreeMap<ResourceKey, BTreeSet<ResourceKey>>,
}

impl SecretReferenceIndex {
    /// Drops whatever was recorded for `referencer` and records `secrets` instead.
    pub fn replace(&mut self, referencer: ResourceKey, secrets: BTreeSet<ResourceKey>) {
        self.references.remove(&referencer);
        if !secrets.is_empty() {
            self.references.insert(referencer, secrets);
        }
    }

    pub fn delete(&mut self, referencer: &ResourceKey) {
        self.references.remove(referencer);
    }

    pub fn referenced_by(&self, referencer: &ResourceKey) -> Vec<ResourceKey> {
        self.references.get(referencer).map(|secrets| secrets.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn referencers_of(&self, secret: &ResourceKey) -> Vec<ResourceKey> {
        self.references.iter().filter(|(_, secrets)| secrets.contains(secret)).map(|(referencer, _)| referencer.clone()).collect()
    }

    pub fn is_referenced(&self, secret: &ResourceKey) -> bool {
        self.references.values().any(|secrets| secrets.contains(secret))
    }
}

/// Collects every secret an object points at through its TLS entries and secret annotations.
///
/// The raw annotations are read rather than the parsed ones so that a secret created after the
/// object still gets picked up.
pub fn collect_secret_references<K: RoutingObject>(object: &K, reader: &AnnotationReader) -> BTreeSet<ResourceKey> {
    let namespace = object.namespace().unwrap_or_default();
    let mut secrets: BTreeSet<ResourceKey> = object
        .tls()
        .iter()
        .filter_map(|tls| tls.secret_name.as_deref())
        .filter(|name| !name.is_empty())
        .map(|name| ResourceKey::namespaced(name, &namespace))
        .collect();

    for annotation in SECRET_REFERENCE_ANNOTATIONS {
        let value = match reader.get_string(annotation) {
            Ok(value) => value,
            Err(e) if e.is_missing() => continue,
            Err(e) => {
                error!("error reading secret reference in annotation {annotation}: {e}");
                continue;
            },
        };
        match ResourceKey::qualify(&value, &namespace) {
            Ok(Some(key)) => {
                secrets.insert(key);
            },
            Ok(None) => (),
            Err(e) => error!("error reading secret reference in annotation {annotation}: {e}"),
        }
    }
    secrets
}
