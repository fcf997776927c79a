// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use k8s_openapi::api::networking::v1::IngressClass;
use kube::ResourceExt;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{common::ResourceKey, configuration::IngressClassConfiguration, routing::RoutingObject, store::ObjectLister};

pub const INGRESS_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";
/// Class name reported for resources admitted without any class.
pub const WILDCARD_CLASS: &str = "_";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IngressClassError {
    #[error("ingress class {0} not found")]
    NotFound(String),
    #[error("ingress class {class} is handled by controller {controller:?}")]
    ForeignController { class: String, controller: Option<String> },
    #[error("ingress class annotation {found} is not equal to the expected {expected}")]
    AnnotationMismatch { expected: String, found: String },
    #[error("resource does not contain a valid ingress class")]
    NoClass,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdmittedClass {
    Named(String),
    Annotation(String),
    Wildcard,
}

impl AdmittedClass {
    pub fn name(&self) -> &str {
        match self {
            AdmittedClass::Named(name) | AdmittedClass::Annotation(name) => name,
            AdmittedClass::Wildcard => WILDCARD_CLASS,
        }
    }
}

/// Decides whether a routing resource belongs to this controller.
#[derive(Clone, TypedBuilder)]
pub struct IngressClassResolver {
    ingress_classes: Arc<dyn ObjectLister<IngressClass>>,
    #[builder(setter(into))]
    controller_class: String,
    configuration: IngressClassConfiguration,
}

impl IngressClassResolver {
    /// An IngressClass is only usable when it exists and names this controller.
    pub fn by_key(&self, name: &str) -> Result<Arc<IngressClass>, IngressClassError> {
        let ingress_class = self.ingress_classes.get_by_key(&ResourceKey::cluster_scoped(name)).ok_or_else(|| IngressClassError::NotFound(name.to_owned()))?;
        let controller = ingress_class.spec.as_ref().and_then(|spec| spec.controller.as_deref());
        if controller != Some(self.controller_class.as_str()) {
            return Err(IngressClassError::ForeignController { class: name.to_owned(), controller: controller.map(str::to_owned) });
        }
        Ok(ingress_class)
    }

    /// `spec.ingressClassName` wins over the class annotation unless it is ignored. Without either,
    /// the resource is only admitted when watching resources without a class.
    pub fn admit<K: RoutingObject>(&self, object: &K) -> Result<AdmittedClass, IngressClassError> {
        if !self.configuration.ignore_ingress_class {
            if let Some(class_name) = object.ingress_class_name() {
                let ingress_class = self.by_key(class_name)?;
                return Ok(AdmittedClass::Named(ingress_class.name_any()));
            }
        }

        if let Some(class) = object.annotations().get(INGRESS_CLASS_ANNOTATION) {
            if *class != self.configuration.annotation_value {
                return Err(IngressClassError::AnnotationMismatch { expected: self.configuration.annotation_value.clone(), found: class.clone() });
            }
            return Ok(AdmittedClass::Annotation(class.clone()));
        }

        if self.configuration.watch_without_class {
            return Ok(AdmittedClass::Wildcard);
        }
        Err(IngressClassError::NoClass)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test::{ingress_class_from_yaml, ingress_from_yaml, lister_of, multi_cluster_ingress_from_yaml};

    fn resolver(configuration: IngressClassConfiguration) -> IngressClassResolver {
        let ours = ingress_class_from_yaml(
            r"
apiVersion: networking.k8s.io/v1
kind: IngressClass
metadata:
  name: nginx
spec:
  controller: k8s.io/ingress-nginx
",
        );
        let theirs = ingress_class_from_yaml(
            r"
apiVersion: networking.k8s.io/v1
kind: IngressClass
metadata:
  name: traefik
spec:
  controller: traefik.io/ingress-controller
",
        );
        IngressClassResolver::builder()
            .ingress_classes(Arc::new(lister_of(vec![ours, theirs])))
            .controller_class("k8s.io/ingress-nginx")
            .configuration(configuration)
            .build()
    }

    fn ingress(class_name: Option<&str>, annotation: Option<&str>) -> k8s_openapi::api::networking::v1::Ingress {
        let class_name = class_name.map(|name| format!("  ingressClassName: {name}")).unwrap_or_default();
        let annotation = annotation.map(|value| format!("  annotations:\n    kubernetes.io/ingress.class: {value}")).unwrap_or_default();
        ingress_from_yaml(&format!(
            r"
apiVersion: networking.k8s.io/v1
kind: Ingress
metadata:
  name: web
  namespace: default
{annotation}
spec:
{class_name}
  rules: []
"
        ))
    }

    #[test]
    fn admits_by_class_name() {
        let resolver = resolver(IngressClassConfiguration::builder().annotation_value("nginx").build());
        assert_eq!(resolver.admit(&ingress(Some("nginx"), None)), Ok(AdmittedClass::Named("nginx".to_owned())));
        assert_eq!(resolver.admit(&ingress(Some("missing"), None)), Err(IngressClassError::NotFound("missing".to_owned())));
        assert!(matches!(resolver.admit(&ingress(Some("traefik"), None)), Err(IngressClassError::ForeignController { .. })));
    }

    #[test]
    fn admits_by_annotation() {
        let resolver = resolver(IngressClassConfiguration::builder().annotation_value("nginx").build());
        assert_eq!(resolver.admit(&ingress(None, Some("nginx"))), Ok(AdmittedClass::Annotation("nginx".to_owned())));
        assert_eq!(
            resolver.admit(&ingress(None, Some("other"))),
            Err(IngressClassError::AnnotationMismatch { expected: "nginx".to_owned(), found: "other".to_owned() })
        );
        assert_eq!(resolver.admit(&ingress(None, None)), Err(IngressClassError::NoClass));
    }

    #[test]
    fn ignored_class_name_falls_through_to_annotation_and_wildcard() {
        let resolver = resolver(IngressClassConfiguration::builder().annotation_value("nginx").ignore_ingress_class(true).watch_without_class(true).build());
        assert_eq!(resolver.admit(&ingress(Some("missing"), Some("nginx"))), Ok(AdmittedClass::Annotation("nginx".to_owned())));

        let admitted = resolver.admit(&ingress(Some("missing"), None)).unwrap();
        assert_eq!(admitted, AdmittedClass::Wildcard);
        assert_eq!(admitted.name(), WILDCARD_CLASS);
    }

    #[test]
    fn multi_cluster_ingresses_use_the_same_rules() {
        let resolver = resolver(IngressClassConfiguration::builder().annotation_value("nginx").build());
        let mci = multi_cluster_ingress_from_yaml(
            r"
apiVersion: networking.karmada.io/v1alpha1
kind: MultiClusterIngress
metadata:
  name: global
  namespace: shop
spec:
  ingressClassName: nginx
",
        );
        assert_eq!(resolver.admit(&mci), Ok(AdmittedClass::Named("nginx".to_owned())));
    }
}
