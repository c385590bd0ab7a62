/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is dual-licensed under either the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree or the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree. You may select, at your option, one of the
 * above-listed licenses.
 */

use serde::Deserialize;
use serde::Serialize;

/// Default ceiling on payload size, in bytes.
pub const DEFAULT_MAX_LENGTH: usize = 10240;

/// Policy applied when parsing netstrings.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Largest payload accepted, or `None` for no limit other than the length prefix cap.
    pub max_length: Option<usize>,
    /// Drain and discard payloads over `max_length`, so the source ends up after the trailing
    /// comma. When false the payload is left unread and the source stays just after the colon.
    pub skip_too_long: bool,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            max_length: Some(DEFAULT_MAX_LENGTH),
            skip_too_long: true,
        }
    }
}

impl ParseConfig {
    /// Config with no payload size limit.
    pub fn unbounded() -> Self {
        Self {
            max_length: None,
            ..Self::default()
        }
    }

    /// Set the payload size limit.
    pub fn with_max_length(self, max_length: Option<usize>) -> Self {
        Self {
            max_length,
            ..self
        }
    }

    /// Set whether over-long payloads are drained.
    pub fn with_skip_too_long(self, skip_too_long: bool) -> Self {
        Self {
            skip_too_long,
            ..self
        }
    }

    /// True if a payload of `length` bytes exceeds the limit.
    pub fn is_too_long(&self, length: usize) -> bool {
        self.max_length.is_some_and(|max| length > max)
    }
}
