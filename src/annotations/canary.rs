// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use serde::Serialize;

use super::{AnnotationError, AnnotationParser, AnnotationReader, ParsedAnnotation};

pub const DEFAULT_WEIGHT_TOTAL: i32 = 100;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CanaryConfig {
    pub enabled: bool,
    pub weight: i32,
    pub weight_total: i32,
    pub header: String,
    pub header_value: String,
    pub header_pattern: String,
    pub cookie: String,
}

impl Default for CanaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0,
            weight_total: DEFAULT_WEIGHT_TOTAL,
            header: String::default(),
            header_value: String::default(),
            header_pattern: String::default(),
            cookie: String::default(),
        }
    }
}

impl CanaryConfig {
    fn is_configured(&self) -> bool {
        self.weight > 0 || !self.header.is_empty() || !self.header_value.is_empty() || !self.header_pattern.is_empty() || !self.cookie.is_empty()
    }
}

pub struct CanaryParser;

impl AnnotationParser for CanaryParser {
    fn name(&self) -> &'static str {
        "canary"
    }

    fn parse(&self, reader: &AnnotationReader) -> Result<ParsedAnnotation, AnnotationError> {
        let defaults = CanaryConfig::default();
        // every field falls back to its default on any getter error
        let config = CanaryConfig {
            enabled: reader.get_bool("canary").unwrap_or(defaults.enabled),
            weight: reader.get_int("canary-weight").unwrap_or(defaults.weight),
            weight_total: reader.get_int("canary-weight-total").unwrap_or(defaults.weight_total),
            header: reader.get_string("canary-by-header").unwrap_or(defaults.header),
            header_value: reader.get_string("canary-by-header-value").unwrap_or(defaults.header_value),
            header_pattern: reader.get_string("canary-by-header-pattern").unwrap_or(defaults.header_pattern),
            cookie: reader.get_string("canary-by-cookie").unwrap_or(defaults.cookie),
        };

        if !config.enabled && config.is_configured() {
            return Err(AnnotationError::invalid_configuration(self.name(), "configured but not enabled"));
        }

        Ok(ParsedAnnotation::Canary(config))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::annotations::DEFAULT_ANNOTATIONS_PREFIX;

    fn parse(pairs: &[(&str, &str)]) -> Result<ParsedAnnotation, AnnotationError> {
        let annotations: BTreeMap<String, String> =
            pairs.iter().map(|(k, v)| (format!("{DEFAULT_ANNOTATIONS_PREFIX}/{k}"), (*v).to_owned())).collect();
        CanaryParser.parse(&AnnotationReader::new(DEFAULT_ANNOTATIONS_PREFIX, Some(&annotations)))
    }

    #[test]
    fn weight_without_enabled_is_rejected() {
        let err = parse(&[("canary-weight", "10")]).unwrap_err();
        assert_eq!(err, AnnotationError::invalid_configuration("canary", "configured but not enabled"));
        assert!(err.to_string().contains("configured but not enabled"));
    }

    #[test]
    fn enabled_with_weight_defaults_total() {
        let ParsedAnnotation::Canary(config) = parse(&[("canary", "true"), ("canary-weight", "10")]).unwrap() else {
            panic!("expected canary config");
        };
        assert!(config.enabled);
        assert_eq!(config.weight, 10);
        assert_eq!(config.weight_total, 100);
    }

    #[test]
    fn header_or_cookie_without_enabled_is_rejected() {
        assert!(parse(&[("canary-by-header", "x-canary")]).is_err());
        assert!(parse(&[("canary-by-cookie", "canary")]).is_err());
        assert!(parse(&[("canary", "false"), ("canary-by-header-pattern", "^always$")]).is_err());
    }

    #[test]
    fn unparseable_fields_fall_back_to_defaults() {
        let ParsedAnnotation::Canary(config) = parse(&[("canary", "true"), ("canary-weight", "ten"), ("canary-weight-total", "1000")]).unwrap()
        else {
            panic!("expected canary config");
        };
        assert_eq!(config.weight, 0);
        assert_eq!(config.weight_total, 1000);

        assert_eq!(parse(&[]), Ok(ParsedAnnotation::Canary(CanaryConfig::default())));
    }
}
