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

use std::borrow::Cow;

use crate::{log_item, message_codes, LogItem, LogKind, StatusTracker};

#[test]
fn r#macro() {
    let log = log_item!("signature/S-1/bbb/cv", "Is the signature intact?", "cv");

    assert_eq!(
        log,
        LogItem {
            kind: LogKind::Informational,
            label: Cow::Borrowed("signature/S-1/bbb/cv"),
            description: Cow::Borrowed("Is the signature intact?"),
            crate_name: env!("CARGO_PKG_NAME").into(),
            crate_version: env!("CARGO_PKG_VERSION").into(),
            file: Cow::Borrowed(file!()),
            function: Cow::Borrowed("cv"),
            line: log.line,
            err_val: None,
            message_id: None,
            attributes: vec![],
        }
    );

    assert!(log.line > 2);
}

#[test]
fn macro_from_string() {
    let desc = format!("token {} dropped", "C-01234567");
    let log = log_item!("context", desc, "add_certificate");

    assert_eq!(log.description, Cow::<str>::Owned("token C-01234567 dropped".to_string()));
}

#[test]
fn message_id_and_attributes() {
    let log = log_item!("xcv", "Is the certificate not revoked?", "xcv")
        .message_id(message_codes::BBB_XCV_ISCR)
        .attribute("certificate", "C-0A0B0C0D")
        .attribute("revocation_time", 1700000000);

    assert_eq!(log.message_id.as_deref(), Some(message_codes::BBB_XCV_ISCR));
    assert_eq!(log.attribute_value("certificate"), Some("C-0A0B0C0D"));
    assert_eq!(log.attribute_value("revocation_time"), Some("1700000000"));
    assert_eq!(log.attribute_value("missing"), None);
}

#[test]
fn success() {
    let mut tracker = StatusTracker::default();
    log_item!("test1", "test item 1", "test func").success(&mut tracker);

    let log_item = tracker.logged_items().first().unwrap();
    assert_eq!(log_item.kind, LogKind::Success);
    assert!(log_item.err_val.is_none());
}

#[test]
fn warning() {
    let mut tracker = StatusTracker::default();
    log_item!("test1", "test item 1", "test func").warning(&mut tracker);

    assert_eq!(tracker.filter_kind(LogKind::Warning).count(), 1);
    assert!(!tracker.has_any_error());
}

#[test]
fn failure_records_error_value() {
    let mut tracker = StatusTracker::default();
    let err = log_item!("test1", "test item 1", "test func")
        .message_id(message_codes::BBB_CV_ISI)
        .failure(&mut tracker, "signature mismatch")
        .unwrap();

    assert_eq!(err, "signature mismatch");

    let item = tracker.logged_items().first().unwrap();
    assert_eq!(item.kind, LogKind::Failure);
    assert_eq!(item.err_val.as_deref(), Some("\"signature mismatch\""));
    assert!(tracker.has_failure(message_codes::BBB_CV_ISI));
}

#[test]
fn failure_no_throw() {
    let mut tracker = StatusTracker::with_error_behavior(crate::ErrorBehavior::StopOnFirstError);
    log_item!("test1", "test item 1", "test func").failure_no_throw(&mut tracker, "nope");

    assert!(tracker.has_error("nope"));
}
