// SPDX-FileCopyrightText: © 2026 Kubvernor authors
// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2026 Kubvernor authors.
//         This program is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License as published by the Free Software Foundation, version 3.
//         This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//         You should have received a copy of the GNU General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
//
//

use super::{AnnotationError, AnnotationParser, AnnotationReader, ParsedAnnotation};

/// Host header sent to the upstream instead of the one in the request.
pub struct UpstreamVhostParser;

impl AnnotationParser for UpstreamVhostParser {
    fn name(&self) -> &'static str {
        "upstream-vhost"
    }

    fn parse(&self, reader: &AnnotationReader) -> Result<ParsedAnnotation, AnnotationError> {
        reader.get_string(self.name()).map(ParsedAnnotation::UpstreamVhost)
    }
}
