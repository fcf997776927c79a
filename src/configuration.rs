// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use serde::Deserialize;
use thiserror::Error;
use typed_builder::TypedBuilder;

use crate::{annotations::DEFAULT_ANNOTATIONS_PREFIX, Result};

fn default_annotations_prefix() -> String {
    DEFAULT_ANNOTATIONS_PREFIX.to_owned()
}

fn enabled() -> bool {
    true
}

#[derive(Clone, Debug, Default, TypedBuilder, Deserialize)]
pub struct IngressClassConfiguration {
    /// Expected value of the `kubernetes.io/ingress.class` annotation.
    #[builder(setter(into))]
    pub annotation_value: String,
    #[serde(default)]
    #[builder(default)]
    pub watch_without_class: bool,
    #[serde(default)]
    #[builder(default)]
    pub ignore_ingress_class: bool,
}

#[derive(Clone, Debug, TypedBuilder, Deserialize)]
pub struct Configuration {
    /// `spec.controller` of the IngressClass objects served by this instance.
    #[builder(setter(into))]
    pub controller_class: String,
    pub ingress_class: IngressClassConfiguration,
    #[serde(default = "default_annotations_prefix")]
    #[builder(default = default_annotations_prefix(), setter(into))]
    pub annotations_prefix: String,
    #[serde(default)]
    #[builder(default)]
    pub annotation_value_word_blocklist: Vec<String>,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub watch_namespace: Option<String>,
    #[serde(default = "enabled")]
    #[builder(default = true)]
    pub watch_ingresses: bool,
    #[serde(default = "enabled")]
    #[builder(default = true)]
    pub watch_multi_cluster_ingresses: bool,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("controller class must be not empty")]
    ControllerClass,
    #[error("annotations prefix must be not empty")]
    AnnotationsPrefix,
    #[error("at least one of ingresses or multi cluster ingresses must be watched")]
    NothingToWatch,
    #[error("annotation value word blocklist contains an empty word")]
    EmptyBlocklistWord,
}

impl Configuration {
    pub fn validate(&self) -> Result<()> {
        if self.controller_class.trim().is_empty() {
            return Err(ConfigurationError::ControllerClass.into());
        }
        if self.annotations_prefix.trim().is_empty() {
            return Err(ConfigurationError::AnnotationsPrefix.into());
        }
        if !self.watch_ingresses && !self.watch_multi_cluster_ingresses {
            return Err(ConfigurationError::NothingToWatch.into());
        }
        if self.annotation_value_word_blocklist.iter().any(|word| word.trim().is_empty()) {
            return Err(ConfigurationError::EmptyBlocklistWord.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_error(configuration: &Configuration) -> Option<ConfigurationError> {
        configuration.validate().err().and_then(|e| e.downcast::<ConfigurationError>().ok()).map(|e| *e)
    }

    #[test]
    fn parse_configuration_with_defaults() {
        let configuration: Configuration = serde_yaml::from_str(
            r"
controller_class: k8s.io/ingress-nginx
ingress_class:
  annotation_value: nginx
",
        )
        .unwrap();
        assert_eq!(configuration.annotations_prefix, DEFAULT_ANNOTATIONS_PREFIX);
        assert!(configuration.watch_ingresses);
        assert!(configuration.watch_multi_cluster_ingresses);
        assert!(!configuration.ingress_class.watch_without_class);
        assert_eq!(configuration.watch_namespace, None);
        assert!(configuration.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_configurations() {
        let class = || IngressClassConfiguration::builder().annotation_value("nginx").build();

        let configuration = Configuration::builder().controller_class("").ingress_class(class()).build();
        assert_eq!(validation_error(&configuration), Some(ConfigurationError::ControllerClass));

        let configuration =
            Configuration::builder().controller_class("k8s.io/ingress-nginx").ingress_class(class()).watch_ingresses(false).watch_multi_cluster_ingresses(false).build();
        assert_eq!(validation_error(&configuration), Some(ConfigurationError::NothingToWatch));

        let configuration = Configuration::builder()
            .controller_class("k8s.io/ingress-nginx")
            .ingress_class(class())
            .annotation_value_word_blocklist(vec!["load_module".to_owned(), " ".to_owned()])
            .build();
        assert_eq!(validation_error(&configuration), Some(ConfigurationError::EmptyBlocklistWord));
    }
}
