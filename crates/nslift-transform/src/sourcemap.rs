// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Source map adjustment for injected code
//!
//! The transform only ever prepends whole lines ahead of the original
//! source and appends code after it, so the input map can be carried over
//! by shifting every mapped position down: prepended lines become empty
//! `;` groups, appended code adds no mapped positions.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Minimal source map v3 document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMap {
    /// Source map spec revision, always 3
    pub version: u32,

    /// Generated file name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Base path prepended to each source
    #[serde(rename = "sourceRoot", skip_serializing_if = "Option::is_none")]
    pub source_root: Option<String>,

    /// Original source paths
    #[serde(default)]
    pub sources: Vec<String>,

    /// Embedded original source texts
    #[serde(rename = "sourcesContent", skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,

    /// Symbol names referenced by the mappings
    #[serde(default)]
    pub names: Vec<String>,

    /// VLQ-encoded mapping groups, one per generated line
    #[serde(default)]
    pub mappings: String,
}

impl SourceMap {
    /// Parse a JSON source map.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Shift every mapped position down by `lines` generated lines.
    pub fn shift_generated_lines(&mut self, lines: usize) {
        if lines == 0 {
            return;
        }
        let mut shifted = ";".repeat(lines);
        shifted.push_str(&self.mappings);
        self.mappings = shifted;
    }
}
