// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

//! Annotation parsing for routing resources.
//!
//! Each annotation (or group of related annotations) is handled by one [`AnnotationParser`]. The
//! [`AnnotationRegistry`] runs every registered parser against an object and collects the results
//! into [`ParsedAnnotations`], keyed by parser name.

mod canary;
mod parser;
mod upstream_vhost;

use std::collections::BTreeMap;

pub use canary::{CanaryConfig, CanaryParser, DEFAULT_WEIGHT_TOTAL};
use kube::core::ObjectMeta;
pub use parser::{AnnotationError, AnnotationReader, DEFAULT_ANNOTATIONS_PREFIX};
use serde::Serialize;
use tracing::warn;
pub use upstream_vhost::UpstreamVhostParser;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ParsedAnnotation {
    Canary(CanaryConfig),
    UpstreamVhost(String),
}

pub type ParsedAnnotations = BTreeMap<String, ParsedAnnotation>;

pub trait AnnotationParser: Send + Sync {
    fn name(&self) -> &'static str;
    fn parse(&self, reader: &AnnotationReader) -> Result<ParsedAnnotation, AnnotationError>;
}

pub struct AnnotationRegistry {
    prefix: String,
    parsers: Vec<Box<dyn AnnotationParser>>,
}

impl AnnotationRegistry {
    pub fn new(prefix: &str) -> Self {
        Self { prefix: prefix.to_owned(), parsers: vec![] }
    }

    pub fn with_default_parsers(prefix: &str) -> Self {
        Self::new(prefix).register(CanaryParser).register(UpstreamVhostParser)
    }

    #[must_use]
    pub fn register(mut self, parser: impl AnnotationParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }

    pub fn reader<'a>(&'a self, meta: &'a ObjectMeta) -> AnnotationReader<'a> {
        AnnotationReader::new(&self.prefix, meta.annotations.as_ref())
    }

    /// Runs all parsers. Missing annotations are skipped, unparseable values are skipped with a
    /// warning, and an invalid configuration fails the whole extraction.
    pub fn extract(&self, meta: &ObjectMeta) -> Result<ParsedAnnotations, AnnotationError> {
        let reader = self.reader(meta);
        let mut parsed = ParsedAnnotations::new();
        for parser in &self.parsers {
            match parser.parse(&reader) {
                Ok(value) => {
                    parsed.insert(parser.name().to_owned(), value);
                },
                Err(AnnotationError::Missing(_)) => (),
                Err(e @ AnnotationError::InvalidContent { .. }) => {
                    warn!("{}/{} skipping annotation {e}", meta.namespace.as_deref().unwrap_or_default(), meta.name.as_deref().unwrap_or_default());
                },
                Err(e @ AnnotationError::InvalidConfiguration { .. }) => return Err(e),
            }
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> ObjectMeta {
        ObjectMeta {
            name: Some("web".to_owned()),
            namespace: Some("default".to_owned()),
            annotations: Some(pairs.iter().map(|(k, v)| (format!("{DEFAULT_ANNOTATIONS_PREFIX}/{k}"), (*v).to_owned())).collect()),
            ..Default::default()
        }
    }

    struct Always;
    impl AnnotationParser for Always {
        fn name(&self) -> &'static str {
            "always"
        }

        fn parse(&self, _: &AnnotationReader) -> Result<ParsedAnnotation, AnnotationError> {
            Ok(ParsedAnnotation::UpstreamVhost("always".to_owned()))
        }
    }

    #[test]
    fn extract_runs_registered_parsers() {
        let registry = AnnotationRegistry::with_default_parsers(DEFAULT_ANNOTATIONS_PREFIX).register(Always);
        let parsed = registry.extract(&meta(&[("upstream-vhost", "backend.internal")])).unwrap();

        assert_eq!(parsed.get("upstream-vhost"), Some(&ParsedAnnotation::UpstreamVhost("backend.internal".to_owned())));
        assert_eq!(parsed.get("canary"), Some(&ParsedAnnotation::Canary(CanaryConfig::default())));
        assert_eq!(parsed.get("always"), Some(&ParsedAnnotation::UpstreamVhost("always".to_owned())));
    }

    #[test]
    fn extract_skips_missing_and_invalid_content() {
        let registry = AnnotationRegistry::new(DEFAULT_ANNOTATIONS_PREFIX).register(UpstreamVhostParser);
        assert!(registry.extract(&meta(&[])).unwrap().is_empty());
        assert!(registry.extract(&meta(&[("upstream-vhost", " ")])).unwrap().is_empty());
    }

    #[test]
    fn extract_fails_on_invalid_configuration() {
        let registry = AnnotationRegistry::with_default_parsers(DEFAULT_ANNOTATIONS_PREFIX);
        let result = registry.extract(&meta(&[("canary-weight", "10")]));
        assert!(matches!(result, Err(AnnotationError::InvalidConfiguration { .. })));
    }
}
