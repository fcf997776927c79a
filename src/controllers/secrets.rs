// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use k8s_openapi::{api::core::v1::Secret, ByteString};
use rustls_pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};
use thiserror::Error;
use tracing::{debug, warn};
use typed_builder::TypedBuilder;

use crate::{
    common::ResourceKey,
    store::{CertificateStore, ObjectLister, SslCertificate, StorageError},
};

const TLS_CERTIFICATE: &str = "tls.crt";
const TLS_PRIVATE_KEY: &str = "tls.key";
const CA_CERTIFICATE: &str = "ca.crt";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
enum SecretError {
    #[error("secret not found")]
    NotFound,
    #[error("{0} is invalid: {1}")]
    InvalidPem(&'static str, String),
    #[error("{0} is present without {1}")]
    Incomplete(&'static str, &'static str),
    #[error("secret has no tls.crt/tls.key pair and no ca.crt")]
    NoKeyMaterial,
}

fn valid_certificate(name: &'static str, data: &ByteString) -> Result<Vec<u8>, SecretError> {
    CertificateDer::from_pem_slice(&data.0).map_err(|e| SecretError::InvalidPem(name, e.to_string()))?;
    Ok(data.0.clone())
}

fn valid_private_key(data: &ByteString) -> Result<Vec<u8>, SecretError> {
    PrivateKeyDer::from_pem_slice(&data.0).map_err(|e| SecretError::InvalidPem(TLS_PRIVATE_KEY, e.to_string()))?;
    Ok(data.0.clone())
}

fn certificate_from_secret(key: &ResourceKey, secret: Option<&Secret>) -> Result<SslCertificate, SecretError> {
    let data = secret.ok_or(SecretError::NotFound)?.data.as_ref().ok_or(SecretError::NoKeyMaterial)?;

    let (certificate, private_key) = match (data.get(TLS_CERTIFICATE), data.get(TLS_PRIVATE_KEY)) {
        (Some(certificate), Some(private_key)) => (Some(valid_certificate(TLS_CERTIFICATE, certificate)?), Some(valid_private_key(private_key)?)),
        (Some(_), None) => return Err(SecretError::Incomplete(TLS_CERTIFICATE, TLS_PRIVATE_KEY)),
        (None, Some(_)) => return Err(SecretError::Incomplete(TLS_PRIVATE_KEY, TLS_CERTIFICATE)),
        (None, None) => (None, None),
    };
    let ca = data.get(CA_CERTIFICATE).map(|ca| valid_certificate(CA_CERTIFICATE, ca)).transpose()?;

    if certificate.is_none() && ca.is_none() {
        return Err(SecretError::NoKeyMaterial);
    }
    Ok(SslCertificate { secret: key.clone(), certificate, private_key, ca })
}

/// Keeps the certificate store in line with the secrets routing resources point at.
#[derive(Clone, TypedBuilder)]
pub struct SecretSynchronizer {
    secrets: Arc<dyn ObjectLister<Secret>>,
    #[builder(default)]
    certificates: CertificateStore,
}

impl SecretSynchronizer {
    pub fn certificates(&self) -> &CertificateStore {
        &self.certificates
    }

    /// Re-reads the secret from the mirror. Missing or unusable secrets are dropped from the store.
    pub fn sync_secret(&self, key: &ResourceKey) -> Result<(), StorageError> {
        let secret = self.secrets.get_by_key(key);
        match certificate_from_secret(key, secret.as_deref()) {
            Ok(certificate) => {
                debug!("Secret {key} synchronized {certificate:?}");
                self.certificates.update(certificate)
            },
            Err(e) => {
                warn!("Secret {key} can't be used {e}");
                self.certificates.remove(key).map(|_| ())
            },
        }
    }

    pub fn remove_secret(&self, key: &ResourceKey) -> Result<(), StorageError> {
        if self.certificates.remove(key)?.is_some() {
            debug!("Secret {key} removed");
        }
        Ok(())
    }
}
