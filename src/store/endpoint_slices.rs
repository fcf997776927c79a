// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use k8s_openapi::api::discovery::v1::EndpointSlice;
use kube::ResourceExt;

use super::ObjectLister;
use crate::common::{KeyError, ResourceKey};

pub const LABEL_SERVICE_NAME: &str = "kubernetes.io/service-name";

/// Answers "which EndpointSlices belong to Service `namespace/name`" from the local mirror.
#[derive(Clone)]
pub struct EndpointSliceIndex {
    lister: Arc<dyn ObjectLister<EndpointSlice>>,
}

impl EndpointSliceIndex {
    pub fn new(lister: Arc<dyn ObjectLister<EndpointSlice>>) -> Self {
        Self { lister }
    }

    /// No slices for a known service is not an error, the slices may simply not be observed yet.
    pub fn by_key(&self, key: &str) -> Result<Vec<Arc<EndpointSlice>>, KeyError> {
        let ResourceKey { namespace, name } = ResourceKey::parse(key)?;

        Ok(self
            .lister
            .list()
            .into_iter()
            .filter(|slice| slice.namespace().unwrap_or_default() == namespace && slice.labels().get(LABEL_SERVICE_NAME) == Some(&name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test::{endpoint_slice_from_yaml, lister_of};

    fn slice(name: &str, namespace: &str, service: &str) -> EndpointSlice {
        endpoint_slice_from_yaml(&format!(
            r"
apiVersion: discovery.k8s.io/v1
kind: EndpointSlice
metadata:
  name: {name}
  namespace: {namespace}
  labels:
    kubernetes.io/service-name: {service}
addressType: IPv4
endpoints: []
"
        ))
    }

    #[test]
    fn by_key_filters_namespace_and_service_label() {
        let index = EndpointSliceIndex::new(Arc::new(lister_of(vec![
            slice("svc-abc", "ns", "svc"),
            slice("svc-def", "ns", "svc"),
            slice("svc-xyz", "other", "svc"),
            slice("another-abc", "ns", "another"),
        ])));

        let mut names = index.by_key("ns/svc").unwrap().iter().map(|s| s.name_any()).collect::<Vec<_>>();
        names.sort();
        assert_eq!(names, vec!["svc-abc".to_owned(), "svc-def".to_owned()]);
    }

    #[test]
    fn by_key_tolerates_missing_slices_and_rejects_bad_keys() {
        let index = EndpointSliceIndex::new(Arc::new(lister_of(Vec::<EndpointSlice>::new())));
        assert_eq!(index.by_key("ns/svc").unwrap().len(), 0);
        assert_eq!(index.by_key("bad-key-no-slash").unwrap_err(), KeyError::Malformed("bad-key-no-slash".to_owned()));
    }
}
