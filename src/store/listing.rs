// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use std::{cmp::Ordering, sync::Arc};

use itertools::Itertools;

use super::{RoutingStore, StorageError};
use crate::routing::{RoutingObject, RoutingResource};

/// Oldest first. Resources created in the same instant are ordered by descending `namespace/name`.
fn by_creation_then_key_descending<K: RoutingObject>(left: &Arc<RoutingResource<K>>, right: &Arc<RoutingResource<K>>) -> Ordering {
    left.creation_timestamp().cmp(&right.creation_timestamp()).then_with(|| right.key().to_string().cmp(&left.key().to_string()))
}

impl<K: RoutingObject> RoutingStore<K> {
    /// Snapshot of every committed resource in a stable order.
    pub fn list(&self) -> Result<Vec<Arc<RoutingResource<K>>>, StorageError> {
        self.list_filtered(|_| true)
    }

    pub fn list_filtered<P>(&self, predicate: P) -> Result<Vec<Arc<RoutingResource<K>>>, StorageError>
    where
        P: Fn(&RoutingResource<K>) -> bool,
    {
        Ok(self.snapshot()?.into_iter().filter(|resource| predicate(resource)).sorted_by(by_creation_then_key_descending).collect())
    }
}
