// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

const DNS1123_SUBDOMAIN_MAX_LENGTH: usize = 253;
const DNS1123_LABEL_FMT: &str = "[a-z0-9]([-a-z0-9]*[a-z0-9])?";

lazy_static! {
    static ref DNS1123_SUBDOMAIN: Regex = Regex::new(&format!("^{DNS1123_LABEL_FMT}(\\.{DNS1123_LABEL_FMT})*$")).expect("DNS-1123 pattern compiles");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DnsNameError {
    #[error("must be no more than 253 characters, got {0}")]
    TooLong(usize),
    #[error("{0} must consist of lower case alphanumeric characters, '-' or '.', and must start and end with an alphanumeric character")]
    Invalid(String),
}

/// RFC 1123 subdomain check, as used for Kubernetes object names.
pub fn validate_dns1123_subdomain(name: &str) -> Result<(), DnsNameError> {
    if name.len() > DNS1123_SUBDOMAIN_MAX_LENGTH {
        return Err(DnsNameError::TooLong(name.len()));
    }
    if !DNS1123_SUBDOMAIN.is_match(name) {
        return Err(DnsNameError::Invalid(name.to_owned()));
    }
    Ok(())
}
