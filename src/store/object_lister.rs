// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::sync::Arc;

use kube::{
    runtime::reflector::{ObjectRef, Store},
    Resource,
};

use crate::common::ResourceKey;

/// Read access to the eventually consistent local mirror of one object kind.
///
/// Objects are shared with the mirror and must be treated as immutable.
pub trait ObjectLister<K>: Send + Sync {
    fn get_by_key(&self, key: &ResourceKey) -> Option<Arc<K>>;
    fn list(&self) -> Vec<Arc<K>>;
}

impl<K> ObjectLister<K> for Store<K>
where
    K: Resource<DynamicType = ()> + Clone + Send + Sync + 'static,
{
    fn get_by_key(&self, key: &ResourceKey) -> Option<Arc<K>> {
        let object_ref =
            if key.namespace.is_empty() { ObjectRef::new(&key.name) } else { ObjectRef::new(&key.name).within(&key.namespace) };
        self.get(&object_ref)
    }

    fn list(&self) -> Vec<Arc<K>> {
        self.state()
    }
}
