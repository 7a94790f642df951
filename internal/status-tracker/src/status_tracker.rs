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

use std::fmt::Debug;

use log::info;

use crate::{LogItem, LogKind};

/// A `StatusTracker` collects the [`LogItem`]s produced while validating a
/// signature and controls what happens when an error is logged.
#[derive(Clone, Debug, Default)]
pub struct StatusTracker {
    error_behavior: ErrorBehavior,
    logged_items: Vec<LogItem>,
}

impl StatusTracker {
    /// Returns a [`StatusTracker`] with the specified [`ErrorBehavior`].
    pub fn with_error_behavior(error_behavior: ErrorBehavior) -> Self {
        Self {
            error_behavior,
            logged_items: vec![],
        }
    }

    /// Returns the current list of log items.
    pub fn logged_items(&self) -> &[LogItem] {
        &self.logged_items
    }

    /// Consumes the tracker and returns its log items.
    pub fn into_items(self) -> Vec<LogItem> {
        self.logged_items
    }

    /// Appends the contents of another [`StatusTracker`] to this one.
    pub fn append(&mut self, other: &StatusTracker) {
        self.logged_items
            .extend(other.logged_items().iter().cloned());
    }

    /// Appends log items to this tracker, keeping their kinds.
    pub fn extend<I: IntoIterator<Item = LogItem>>(&mut self, items: I) {
        self.logged_items.extend(items);
    }

    /// Adds a non-error [`LogItem`] to this status tracker.
    ///
    /// Primarily intended for use by [`LogItem::success()`],
    /// [`LogItem::informational()`] or [`LogItem::warning()`].
    pub fn add_non_error(&mut self, log_item: LogItem) {
        if log_item.kind != LogKind::Success {
            info!("Validation info: {log_item:#?}");
        }
        self.logged_items.push(log_item);
    }

    /// Adds an error-case [`LogItem`] to this status tracker.
    ///
    /// Will return `Err(err)` if configured to stop immediately on errors or
    /// `Ok(err)` if configured to continue on errors. _(See [`ErrorBehavior`].)_
    ///
    /// Primarily intended for use by [`LogItem::failure()`].
    pub fn add_error<E>(&mut self, log_item: LogItem, err: E) -> Result<E, E> {
        self.logged_items.push(log_item);

        match self.error_behavior {
            ErrorBehavior::StopOnFirstError => Err(err),
            ErrorBehavior::ContinueWhenPossible => Ok(err),
        }
    }

    /// Returns the [`LogItem`]s of a given kind.
    pub fn filter_kind(&self, kind: LogKind) -> impl Iterator<Item = &LogItem> {
        self.logged_items
            .iter()
            .filter(move |item| item.kind == kind)
    }

    /// Returns the [`LogItem`]s that have error conditions.
    pub fn filter_errors(&self) -> impl Iterator<Item = &LogItem> {
        self.filter_kind(LogKind::Failure)
    }

    /// Returns `true` if the log contains an item with the given message
    /// identifier.
    pub fn has_message(&self, id: &str) -> bool {
        self.logged_items
            .iter()
            .any(|item| item.message_id.as_deref() == Some(id))
    }

    /// Returns `true` if the log contains a failure with the given message
    /// identifier.
    pub fn has_failure(&self, id: &str) -> bool {
        self.filter_errors()
            .any(|item| item.message_id.as_deref() == Some(id))
    }

    /// Returns `true` if the validation log contains a specific error.
    pub fn has_error<E: Debug>(&self, err: E) -> bool {
        let err_type = format!("{:?}", &err);
        self.logged_items.iter().any(|vi| {
            if let Some(e) = &vi.err_val {
                e == &err_type
            } else {
                false
            }
        })
    }

    /// Returns `true` if the validation log contains any error.
    pub fn has_any_error(&self) -> bool {
        self.filter_errors().next().is_some()
    }
}

/// `ErrorBehavior` configures the behavior of [`StatusTracker`] when its
/// [`add_error`] function is called.
///
/// [`add_error`]: StatusTracker::add_error
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ErrorBehavior {
    /// If an error is encountered, stop validation immediately.
    StopOnFirstError,

    /// If an error is encountered, log it and continue validation as much as
    /// possible.
    #[default]
    ContinueWhenPossible,
}
