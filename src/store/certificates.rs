// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{
    collections::BTreeMap,
    sync::{Arc, RwLock},
};

use super::StorageError;
use crate::common::ResourceKey;

/// Key material taken from a TLS secret, already checked to be well formed PEM.
#[derive(Clone, PartialEq, Eq)]
pub struct SslCertificate {
    pub secret: ResourceKey,
    pub certificate: Option<Vec<u8>>,
    pub private_key: Option<Vec<u8>>,
    pub ca: Option<Vec<u8>>,
}

impl std::fmt::Debug for SslCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SslCertificate")
            .field("secret", &self.secret)
            .field("certificate", &self.certificate.as_ref().map(Vec::len))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("ca", &self.ca.as_ref().map(Vec::len))
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct CertificateStore {
    certificates: Arc<RwLock<BTreeMap<ResourceKey, Arc<SslCertificate>>>>,
}

impl CertificateStore {
    pub fn update(&self, certificate: SslCertificate) -> Result<(), StorageError> {
        let mut lock = self.certificates.write().map_err(|_| StorageError::LockingError)?;
        lock.insert(certificate.secret.clone(), Arc::new(certificate));
        Ok(())
    }

    pub fn remove(&self, secret: &ResourceKey) -> Result<Option<Arc<SslCertificate>>, StorageError> {
        let mut lock = self.certificates.write().map_err(|_| StorageError::LockingError)?;
        Ok(lock.remove(secret))
    }

    pub fn get(&self, secret: &ResourceKey) -> Result<Option<Arc<SslCertificate>>, StorageError> {
        let lock = self.certificates.read().map_err(|_| StorageError::LockingError)?;
        Ok(lock.get(secret).cloned())
    }

    pub fn list(&self) -> Result<Vec<Arc<SslCertificate>>, StorageError> {
        let lock = self.certificates.read().map_err(|_| StorageError::LockingError)?;
        Ok(lock.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_never_prints_key_material() {
        let certificate = SslCertificate {
            secret: ResourceKey::namespaced("web-tls", "default"),
            certificate: Some(b"certificate".to_vec()),
            private_key: Some(b"super secret".to_vec()),
            ca: None,
        };
        let printed = format!("{certificate:?}");
        assert!(!printed.contains("super secret"));
        assert!(printed.contains("<redacted>"));

        let store = CertificateStore::default();
        store.update(certificate.clone()).unwrap();
        assert_eq!(store.get(&certificate.secret).unwrap().as_deref(), Some(&certificate));
        assert_eq!(store.list().unwrap().len(), 1);
        assert!(store.remove(&certificate.secret).unwrap().is_some());
        assert!(store.get(&certificate.secret).unwrap().is_none());
    }
}
