// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{collections::HashSet, fmt::Display, net::IpAddr, sync::Arc};

use k8s_openapi::{
    api::{
        core::v1::{ObjectReference, Service, ServicePort},
        discovery::v1::EndpointSlice,
    },
    apimachinery::pkg::util::intstr::IntOrString,
};
use tracing::{debug, error};

use super::{dns::validate_dns1123_subdomain, Protocol};
use crate::common::ResourceKey;

const SERVICE_TYPE_EXTERNAL_NAME: &str = "ExternalName";
const LOCALHOST: &str = "localhost";

/// One destination a backend can be reached at. `target` is informational only.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendEndpoint {
    pub address: String,
    pub port: String,
    pub target: Option<ObjectReference>,
}

impl BackendEndpoint {
    /// `address:port`, with IPv6 addresses bracketed.
    pub fn host_port(&self) -> String {
        join_host_port(&self.address, &self.port)
    }
}

fn join_host_port(address: &str, port: &str) -> String {
    if address.contains(':') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

fn is_loopback(address: &IpAddr) -> bool {
    match address {
        IpAddr::V4(v4) => v4.is_loopback(),
        IpAddr::V6(v6) => v6.is_loopback() || v6.to_ipv4_mapped().is_some_and(|v4| v4.is_loopback()),
    }
}

/// Numeric value of a target port. Named ports that are not numbers count as 0.
fn target_port_value(target_port: Option<&IntOrString>) -> i32 {
    match target_port {
        Some(IntOrString::Int(port)) => *port,
        Some(IntOrString::String(port)) => port.parse().unwrap_or(0),
        None => 0,
    }
}

fn resolve_external_name(service_key: &ResourceKey, external_name: &str, service_port: &ServicePort) -> Option<BackendEndpoint> {
    let ip = external_name.parse::<IpAddr>().ok();
    if external_name == LOCALHOST || ip.as_ref().is_some_and(is_loopback) {
        error!("Invalid attempt to use localhost name {external_name} in {service_key}");
        return None;
    }

    if ip.is_none() {
        if let Err(e) = validate_dns1123_subdomain(external_name.strip_suffix('.').unwrap_or(external_name)) {
            error!("Invalid DNS name {external_name}: {e}");
            return None;
        }
    }

    debug!("Using service {service_key} of type ExternalName");
    Some(BackendEndpoint {
        address: external_name.to_owned(),
        port: target_port_value(service_port.target_port.as_ref()).to_string(),
        target: None,
    })
}

/// Resolves the endpoints serving `service_port` of `service` for `protocol`.
///
/// `endpoint_slices_of` looks up the slices of a service by its `namespace/name` key. The result is
/// deduplicated on `address:port`, so service ports sharing a target port contribute each endpoint
/// once. Nothing to resolve yields an empty list.
pub fn resolve_endpoints<F, E>(service: Option<&Service>, service_port: Option<&ServicePort>, protocol: Protocol, endpoint_slices_of: F) -> Vec<BackendEndpoint>
where
    F: Fn(&str) -> Result<Vec<Arc<EndpointSlice>>, E>,
    E: Display,
{
    let mut endpoints = vec![];
    let (Some(service), Some(service_port)) = (service, service_port) else {
        return endpoints;
    };
    let service_key = ResourceKey::from_resource(service);
    let spec = service.spec.as_ref();

    if spec.and_then(|spec| spec.type_.as_deref()) == Some(SERVICE_TYPE_EXTERNAL_NAME) {
        let external_name = spec.and_then(|spec| spec.external_name.as_deref()).unwrap_or_default();
        endpoints.extend(resolve_external_name(&service_key, external_name, service_port));
        return endpoints;
    }

    debug!("Getting endpoints for service {service_key} and port {:?}", service_port.name);
    let endpoint_slices = match endpoint_slices_of(&service_key.to_string()) {
        Ok(endpoint_slices) => endpoint_slices,
        Err(e) => {
            error!("Error obtaining EndpointSlices for service {service_key}: {e}");
            return endpoints;
        },
    };

    let port_name = service_port.name.as_deref().unwrap_or_default();
    let numeric_target_port = match service_port.target_port.as_ref() {
        Some(IntOrString::Int(port)) => Some(*port),
        Some(IntOrString::String(_)) => None,
        None => Some(0),
    };
    let mut processed = HashSet::new();

    for endpoint_slice in endpoint_slices {
        let ports = endpoint_slice.ports.as_deref().unwrap_or_default();
        let mut matched_port_name = false;

        for (index, endpoint_port) in ports.iter().enumerate() {
            if Protocol::try_from(endpoint_port.protocol.as_deref()).ok() != Some(protocol) {
                continue;
            }

            let mut target_port = 0;
            if port_name.is_empty() || endpoint_port.name.as_deref() == Some(port_name) {
                target_port = endpoint_port.port.unwrap_or_default();
                matched_port_name = true;
            }

            // A numeric target port stands in when no slice port matched by name.
            if index == ports.len() - 1 && !matched_port_name {
                if let Some(port) = numeric_target_port {
                    target_port = port;
                }
            }
            if target_port <= 0 {
                continue;
            }

            let port = target_port.to_string();
            for endpoint in &endpoint_slice.endpoints {
                for address in &endpoint.addresses {
                    if !processed.insert(join_host_port(address, &port)) {
                        continue;
                    }
                    endpoints.push(BackendEndpoint { address: address.clone(), port: port.clone(), target: endpoint.target_ref.clone() });
                }
            }
        }
    }

    debug!("Endpoints found for service {service_key}: {endpoints:?}");
    endpoints
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{
        test::{endpoint_slice_from_yaml, service_from_yaml},
        KeyError,
    };

    fn service(yaml_spec: &str) -> Service {
        service_from_yaml(&format!(
            r"
apiVersion: v1
kind: Service
metadata:
  name: svc
  namespace: ns
spec:
{yaml_spec}
"
        ))
    }

    fn slices(yaml: &[&str]) -> impl Fn(&str) -> Result<Vec<Arc<EndpointSlice>>, KeyError> {
        let slices: Vec<_> = yaml.iter().map(|yaml| Arc::new(endpoint_slice_from_yaml(yaml))).collect();
        move |key| {
            assert_eq!(key, "ns/svc");
            Ok(slices.clone())
        }
    }

    fn no_slices(key: &str) -> Result<Vec<Arc<EndpointSlice>>, KeyError> {
        panic!("slices of {key} must not be looked up")
    }

    fn addresses(endpoints: &[BackendEndpoint]) -> Vec<String> {
        endpoints.iter().map(BackendEndpoint::host_port).collect()
    }

    const TWO_ADDRESSES: &str = r"
apiVersion: discovery.k8s.io/v1
kind: EndpointSlice
metadata:
  name: svc-abc
  namespace: ns
addressType: IPv4
ports:
- name: http
  port: 8080
  protocol: TCP
endpoints:
- addresses: [10.0.0.1]
  targetRef:
    kind: Pod
    name: pod-1
- addresses: [10.0.0.2]
";

    #[test]
    fn missing_service_or_port_resolves_to_nothing() {
        let port = ServicePort { port: 80, ..Default::default() };
        assert!(resolve_endpoints(None, Some(&port), Protocol::Tcp, no_slices).is_empty());
        assert!(resolve_endpoints(Some(&service("  ports: []")), None, Protocol::Tcp, no_slices).is_empty());
    }

    #[test]
    fn named_port_matches_slice_port() {
        let service = service("  ports:\n  - name: http\n    port: 80\n    targetPort: http");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];

        let endpoints = resolve_endpoints(Some(&service), Some(port), Protocol::Tcp, slices(&[TWO_ADDRESSES]));
        assert_eq!(addresses(&endpoints), vec!["10.0.0.1:8080", "10.0.0.2:8080"]);
        assert_eq!(endpoints[0].target.as_ref().and_then(|target| target.name.as_deref()), Some("pod-1"));
        assert_eq!(endpoints[1].target, None);
    }

    #[test]
    fn protocol_mismatch_resolves_to_nothing() {
        let service = service("  ports:\n  - name: http\n    port: 80");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];
        assert!(resolve_endpoints(Some(&service), Some(port), Protocol::Udp, slices(&[TWO_ADDRESSES])).is_empty());
    }

    #[test]
    fn numeric_target_port_is_used_when_no_name_matches() {
        let service = service("  ports:\n  - name: web\n    port: 80\n    targetPort: 9090");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];

        let endpoints = resolve_endpoints(Some(&service), Some(port), Protocol::Tcp, slices(&[TWO_ADDRESSES]));
        assert_eq!(addresses(&endpoints), vec!["10.0.0.1:9090", "10.0.0.2:9090"]);
    }

    #[test]
    fn named_target_port_without_match_resolves_to_nothing() {
        let service = service("  ports:\n  - name: web\n    port: 80\n    targetPort: web");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];
        assert!(resolve_endpoints(Some(&service), Some(port), Protocol::Tcp, slices(&[TWO_ADDRESSES])).is_empty());
    }

    #[test]
    fn duplicates_across_slices_are_dropped() {
        let second = r"
apiVersion: discovery.k8s.io/v1
kind: EndpointSlice
metadata:
  name: svc-def
  namespace: ns
addressType: IPv6
ports:
- port: 8080
endpoints:
- addresses: [10.0.0.2, 'fd00::1']
";
        let service = service("  ports:\n  - port: 80");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];

        let endpoints = resolve_endpoints(Some(&service), Some(port), Protocol::Tcp, slices(&[TWO_ADDRESSES, second]));
        assert_eq!(addresses(&endpoints), vec!["10.0.0.1:8080", "10.0.0.2:8080", "[fd00::1]:8080"]);
    }

    #[test]
    fn lookup_errors_resolve_to_nothing() {
        let service = service("  ports:\n  - port: 80");
        let port = &service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0];
        let failing = |key: &str| -> Result<Vec<Arc<EndpointSlice>>, KeyError> { Err(KeyError::Malformed(key.to_owned())) };
        assert!(resolve_endpoints(Some(&service), Some(port), Protocol::Tcp, failing).is_empty());
    }

    #[test]
    fn external_names() {
        let resolve = |external_name: &str, target_port: &str| {
            let service = service(&format!("  type: ExternalName\n  externalName: '{external_name}'\n  ports:\n  - port: 80\n    targetPort: {target_port}"));
            let port = service.spec.as_ref().unwrap().ports.as_ref().unwrap()[0].clone();
            resolve_endpoints(Some(&service), Some(&port), Protocol::Tcp, no_slices)
        };

        assert_eq!(
            resolve("api.example.com.", "443"),
            vec![BackendEndpoint { address: "api.example.com.".to_owned(), port: "443".to_owned(), target: None }]
        );
        assert_eq!(addresses(&resolve("192.0.2.10", "8080")), vec!["192.0.2.10:8080"]);
        assert_eq!(addresses(&resolve("api.example.com", "https")), vec!["api.example.com:0"]);
        assert!(resolve("localhost", "80").is_empty());
        assert!(resolve("127.0.0.1", "80").is_empty());
        assert!(resolve("::1", "80").is_empty());
        assert!(resolve("::ffff:127.0.0.2", "80").is_empty());
        assert!(resolve("Not_A_Host", "80").is_empty());
    }
}
