// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

mod ingress_class;
mod secrets;
mod synchronizer;
mod watchers;

pub use ingress_class::{AdmittedClass, IngressClassError, IngressClassResolver, INGRESS_CLASS_ANNOTATION, WILDCARD_CLASS};
pub use secrets::SecretSynchronizer;
pub use synchronizer::{RoutingResourceSynchronizer, StoreEvent, StoreEventKind, SyncError};
pub use watchers::{mirror, watch_routing_resources, watch_secrets, RoutingEventHandler, SecretEventHandler};
