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

use p256::pkcs8::EncodePublicKey;

use crate::{
    public_key::{PublicKeyError, PublicKeyInfo},
    raw_signature::EncryptionAlgorithm,
};

#[test]
fn p256_key() {
    let sk = p256::ecdsa::SigningKey::from_bytes(&p256::FieldBytes::clone_from_slice(&[7u8; 32]))
        .unwrap();
    let spki = sk.verifying_key().to_public_key_der().unwrap();

    let info = PublicKeyInfo::from_spki_der(spki.as_bytes()).unwrap();
    assert_eq!(info.algorithm, EncryptionAlgorithm::Ecdsa);
    assert_eq!(info.key_size, 256);
}

#[test]
fn ed25519_key() {
    let sk = ed25519_dalek::SigningKey::from_bytes(&[9u8; 32]);
    let spki = sk.verifying_key().to_public_key_der().unwrap();

    let info = PublicKeyInfo::from_spki_der(spki.as_bytes()).unwrap();
    assert_eq!(info.algorithm, EncryptionAlgorithm::Ed25519);
    assert_eq!(info.key_size, 256);
}

#[test]
fn garbage() {
    assert_eq!(
        PublicKeyInfo::from_spki_der(&[0x30, 0x03, 0x01, 0x02, 0x03]),
        Err(PublicKeyError::InvalidEncoding)
    );
}
