// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Embedded deep-merge runtime helper
//!
//! Generated modules reference the helper through a stable import specifier
//! instead of carrying a copy of the merge algorithm; the helper ships as a
//! fixed, versioned CommonJS module written next to the emitted output.

/// Version tag of the shipped runtime helper
pub const RUNTIME_VERSION: &str = "0.1.0";

/// File name the helper module is written under
pub const RUNTIME_FILE_NAME: &str = "nslift-runtime.js";

/// Identifier the generated code binds the runtime helper to
pub const RUNTIME_IDENT: &str = "__nslift";

/// CommonJS source of the deep-merge helper
pub const RUNTIME_SOURCE: &str = include_str!("../runtime/runtime.js");
