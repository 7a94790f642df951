// Copyright 2022 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

use std::{borrow::Cow, fmt::Debug};

use crate::StatusTracker;

/// Detailed information about a validation check, an error, or other
/// noteworthy condition.
///
/// Use the [`log_item`](crate::log_item) macro to create a `LogItem`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LogItem {
    /// Kind of log item.
    pub kind: LogKind,

    /// Location in the report tree where the item was produced
    /// (for example `signature/S-1/bbb/xcv`).
    pub label: Cow<'static, str>,

    /// Human-readable description of the check or condition.
    pub description: Cow<'static, str>,

    /// Name of the crate that generated the item.
    pub crate_name: Cow<'static, str>,

    /// Version of the crate that generated the item.
    pub crate_version: Cow<'static, str>,

    /// Source file where the condition was detected.
    pub file: Cow<'static, str>,

    /// Function where the condition was detected.
    pub function: Cow<'static, str>,

    /// Source line number where the condition was detected.
    pub line: u32,

    /// Error value as string.
    pub err_val: Option<Cow<'static, str>>,

    /// Validation message identifier (see [`message_codes`](crate::message_codes)).
    pub message_id: Option<Cow<'static, str>>,

    /// Free-form attributes attached to the item, in insertion order.
    pub attributes: Vec<(Cow<'static, str>, String)>,
}

impl Default for LogItem {
    fn default() -> Self {
        LogItem {
            kind: LogKind::Informational,
            label: Cow::Borrowed(""),
            description: Cow::Borrowed(""),
            crate_name: env!("CARGO_PKG_NAME").into(),
            crate_version: env!("CARGO_PKG_VERSION").into(),
            file: Cow::Borrowed(""),
            function: Cow::Borrowed(""),
            line: 0,
            err_val: None,
            message_id: None,
            attributes: vec![],
        }
    }
}

impl LogItem {
    /// Add a validation message identifier.
    #[must_use]
    pub fn message_id(self, id: &'static str) -> Self {
        LogItem {
            message_id: Some(id.into()),
            ..self
        }
    }

    /// Attach a named attribute (for example a token id or a time).
    #[must_use]
    pub fn attribute<K: Into<Cow<'static, str>>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.attributes.push((key.into(), value.to_string()));
        self
    }

    /// Returns the value of the first attribute with the given name.
    pub fn attribute_value(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Records this item as a passed check.
    pub fn success(mut self, tracker: &mut StatusTracker) {
        self.kind = LogKind::Success;
        tracker.add_non_error(self);
    }

    /// Records this item as information.
    pub fn informational(mut self, tracker: &mut StatusTracker) {
        self.kind = LogKind::Informational;
        tracker.add_non_error(self);
    }

    /// Records this item as a warning. Warnings never stop validation.
    pub fn warning(mut self, tracker: &mut StatusTracker) {
        self.kind = LogKind::Warning;
        tracker.add_non_error(self);
    }

    /// Records this item as a failure.
    ///
    /// Returns `Err(err)` if the tracker is configured to stop on the first
    /// error, `Ok(err)` otherwise.
    pub fn failure<E: Debug>(mut self, tracker: &mut StatusTracker, err: E) -> Result<E, E> {
        self.kind = LogKind::Failure;
        self.err_val = Some(format!("{err:?}").into());
        tracker.add_error(self, err)
    }

    /// Records this item as a failure without consulting the tracker's
    /// [`ErrorBehavior`](crate::ErrorBehavior).
    pub fn failure_no_throw<E: Debug>(mut self, tracker: &mut StatusTracker, err: E) {
        self.kind = LogKind::Failure;
        self.err_val = Some(format!("{err:?}").into());

        tracker.add_non_error(self);
    }
}

/// Creates a [`LogItem`] struct that is annotated with the source file and line
/// number where the log condition was discovered.
///
/// Takes three parameters, each of which may be a `'static str` or `String`:
///
/// * `label`: location in the report tree this item refers to
/// * `description`: human-readable reason for this `LogItem` to have been
///   generated
/// * `function`: name of the function generating this `LogItem`
///
/// ## Example
///
/// ```
/// # use ades_status_tracker::{log_item, LogKind};
/// let log = log_item!("signature/S-1", "Is the signature intact?", "cv");
///
/// assert_eq!(log.kind, LogKind::Informational);
/// assert_eq!(log.file, file!());
/// assert!(log.line > 2);
/// ```
#[macro_export]
macro_rules! log_item {
    ($label:expr, $description:expr, $function:expr) => {{
        $crate::LogItem {
            kind: $crate::LogKind::Informational,
            label: $label.into(),
            crate_name: env!("CARGO_PKG_NAME").into(),
            crate_version: env!("CARGO_PKG_VERSION").into(),
            file: file!().into(),
            function: $function.into(),
            line: line!(),
            description: $description.into(),
            ..Default::default()
        }
    }};
}

/// Severity of a [`LogItem`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LogKind {
    /// A check that passed.
    Success,

    /// Information that does not affect the verdict.
    Informational,

    /// A check that failed at a non-blocking level.
    Warning,

    /// A check or operation that failed.
    Failure,
}
