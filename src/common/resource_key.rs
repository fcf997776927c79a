// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::fmt::Display;

use kube::{Resource, ResourceExt};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("key {0} is invalid")]
    Malformed(String),
}

/// Identity of a namespaced (or cluster scoped) object in the watch mirror.
///
/// The textual form is the usual `namespace/name` pair. Cluster scoped objects have an empty
/// namespace and are rendered as `name` only.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ResourceKey {
    pub namespace: String,
    pub name: String,
}

impl ResourceKey {
    pub fn namespaced(name: &str, namespace: &str) -> Self {
        Self { name: name.to_owned(), namespace: namespace.to_owned() }
    }

    pub fn cluster_scoped(name: &str) -> Self {
        Self { name: name.to_owned(), namespace: String::default() }
    }

    pub fn from_resource<R: Resource>(resource: &R) -> Self {
        Self { namespace: resource.namespace().unwrap_or_default(), name: resource.name_any() }
    }

    /// Parses a strict `namespace/name` key. Anything other than exactly two segments is rejected.
    pub fn parse(key: &str) -> Result<Self, KeyError> {
        let mut segments = key.split('/');
        match (segments.next(), segments.next(), segments.next()) {
            (Some(namespace), Some(name), None) => Ok(Self::namespaced(name, namespace)),
            _ => Err(KeyError::Malformed(key.to_owned())),
        }
    }

    /// Resolves an object reference such as an annotation value against a default namespace.
    ///
    /// `name` becomes `default_namespace/name`, `namespace/name` is taken verbatim. An empty name
    /// yields `None`.
    pub fn qualify(reference: &str, default_namespace: &str) -> Result<Option<Self>, KeyError> {
        let mut segments = reference.split('/');
        let key = match (segments.next(), segments.next(), segments.next()) {
            (Some(name), None, None) => Self::namespaced(name, default_namespace),
            (Some(""), Some(name), None) => Self::namespaced(name, default_namespace),
            (Some(namespace), Some(name), None) => Self::namespaced(name, namespace),
            _ => return Err(KeyError::Malformed(reference.to_owned())),
        };
        if key.name.is_empty() {
            Ok(None)
        } else {
            Ok(Some(key))
        }
    }
}

impl Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}/{}", self.namespace, self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keys() {
        assert_eq!(ResourceKey::parse("ns/svc"), Ok(ResourceKey::namespaced("svc", "ns")));
        assert_eq!(ResourceKey::parse("bad-key-no-slash"), Err(KeyError::Malformed("bad-key-no-slash".to_owned())));
        assert!(ResourceKey::parse("a/b/c").is_err());
        assert_eq!(ResourceKey::namespaced("svc", "ns").to_string(), "ns/svc");
        assert_eq!(ResourceKey::cluster_scoped("nginx").to_string(), "nginx");
    }

    #[test]
    fn qualify_references() {
        assert_eq!(ResourceKey::qualify("auth", "default"), Ok(Some(ResourceKey::namespaced("auth", "default"))));
        assert_eq!(ResourceKey::qualify("other/auth", "default"), Ok(Some(ResourceKey::namespaced("auth", "other"))));
        assert_eq!(ResourceKey::qualify("", "default"), Ok(None));
        assert_eq!(ResourceKey::qualify("other/", "default"), Ok(None));
        assert!(ResourceKey::qualify("a/b/c", "default").is_err());
    }
}
