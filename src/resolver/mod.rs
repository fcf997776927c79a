// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

//! Backend resolution: turns a Service and one of its ports into the concrete endpoints traffic can
//! be sent to.

mod backends;
mod dns;
mod endpoints;

pub use backends::BackendResolver;
pub use dns::{validate_dns1123_subdomain, DnsNameError};
pub use endpoints::{resolve_endpoints, BackendEndpoint};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported protocol {0}")]
pub struct ProtocolError(String);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
    Sctp,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
            Protocol::Sctp => "SCTP",
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kubernetes leaves the protocol unset when it is TCP.
impl TryFrom<Option<&str>> for Protocol {
    type Error = ProtocolError;

    fn try_from(protocol: Option<&str>) -> Result<Self, Self::Error> {
        match protocol {
            None | Some("TCP") => Ok(Protocol::Tcp),
            Some("UDP") => Ok(Protocol::Udp),
            Some("SCTP") => Ok(Protocol::Sctp),
            Some(other) => Err(ProtocolError(other.to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocols() {
        assert_eq!(Protocol::try_from(None), Ok(Protocol::Tcp));
        assert_eq!(Protocol::try_from(Some("UDP")), Ok(Protocol::Udp));
        assert_eq!(Protocol::try_from(Some("udp")), Err(ProtocolError("udp".to_owned())));
        assert_eq!(Protocol::Sctp.to_string(), "SCTP");
    }
}
