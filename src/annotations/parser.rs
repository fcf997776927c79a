// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::collections::BTreeMap;

use thiserror::Error;

pub const DEFAULT_ANNOTATIONS_PREFIX: &str = "nginx.ingress.kubernetes.io";

static NO_ANNOTATIONS: BTreeMap<String, String> = BTreeMap::new();

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnnotationError {
    #[error("annotation {0} is missing")]
    Missing(String),
    #[error("annotation {name} contains invalid value: {reason}")]
    InvalidContent { name: String, reason: String },
    #[error("annotation {name} contains invalid configuration: {reason}")]
    InvalidConfiguration { name: String, reason: String },
}

impl AnnotationError {
    pub fn is_missing(&self) -> bool {
        matches!(self, AnnotationError::Missing(_))
    }

    pub fn invalid_content(name: &str, reason: impl Into<String>) -> Self {
        AnnotationError::InvalidContent { name: name.to_owned(), reason: reason.into() }
    }

    pub fn invalid_configuration(name: &str, reason: impl Into<String>) -> Self {
        AnnotationError::InvalidConfiguration { name: name.to_owned(), reason: reason.into() }
    }
}

/// Typed getters over the annotations of one object. Names are given without the prefix.
#[derive(Clone, Copy, Debug)]
pub struct AnnotationReader<'a> {
    prefix: &'a str,
    annotations: &'a BTreeMap<String, String>,
}

impl<'a> AnnotationReader<'a> {
    pub fn new(prefix: &'a str, annotations: Option<&'a BTreeMap<String, String>>) -> Self {
        Self { prefix, annotations: annotations.unwrap_or(&NO_ANNOTATIONS) }
    }

    fn value(&self, name: &str) -> Result<&'a str, AnnotationError> {
        self.annotations.get(&format!("{}/{name}", self.prefix)).map(String::as_str).ok_or_else(|| AnnotationError::Missing(name.to_owned()))
    }

    pub fn get_bool(&self, name: &str) -> Result<bool, AnnotationError> {
        match self.value(name)?.trim() {
            "1" | "t" | "T" | "true" | "TRUE" | "True" => Ok(true),
            "0" | "f" | "F" | "false" | "FALSE" | "False" => Ok(false),
            other => Err(AnnotationError::invalid_content(name, format!("{other} is not a boolean"))),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<i32, AnnotationError> {
        let value = self.value(name)?.trim();
        value.parse::<i32>().map_err(|e| AnnotationError::invalid_content(name, format!("{value} {e}")))
    }

    pub fn get_string(&self, name: &str) -> Result<String, AnnotationError> {
        let value = self.value(name)?.trim();
        if value.is_empty() {
            return Err(AnnotationError::invalid_content(name, "empty value"));
        }
        Ok(value.to_owned())
    }
}
