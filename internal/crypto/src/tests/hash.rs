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

use std::str::FromStr;

use crate::hash::{sha1, sha256, DigestAlgorithm};

#[test]
fn test_sha1() {
    let hash = sha1(b"test message");
    assert_eq!(
        hash,
        [
            53, 238, 131, 134, 65, 13, 65, 209, 75, 63, 119, 159, 201, 95, 70, 149, 244, 133, 22,
            130
        ]
    );
}

#[test]
fn test_sha256() {
    assert_eq!(
        const_hex::encode(sha256(b"abc")),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn output_len_matches_digest() {
    for alg in [
        DigestAlgorithm::Sha1,
        DigestAlgorithm::Sha224,
        DigestAlgorithm::Sha256,
        DigestAlgorithm::Sha384,
        DigestAlgorithm::Sha512,
    ] {
        assert_eq!(alg.digest(b"data").len(), alg.output_len(), "{alg}");
        assert_eq!(DigestAlgorithm::from_oid(&alg.oid()), Some(alg));
    }
}

#[test]
fn parse_names() {
    assert_eq!(
        DigestAlgorithm::from_str("sha-256").unwrap(),
        DigestAlgorithm::Sha256
    );
    assert_eq!(
        DigestAlgorithm::from_str("SHA1").unwrap(),
        DigestAlgorithm::Sha1
    );
    assert!(DigestAlgorithm::from_str("MD5").is_err());
}

#[test]
fn serde_names() {
    let json = serde_json::to_string(&DigestAlgorithm::Sha384).unwrap();
    assert_eq!(json, "\"SHA384\"");
}
