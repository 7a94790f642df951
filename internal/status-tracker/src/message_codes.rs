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

//! Message identifiers attached to validation checks.
//!
//! Identifiers follow the ETSI EN 319 102-1 building block names:
//! `BBB_<block>_<check>` for the Basic Building Blocks, `ADEST_*` for the
//! validation process for signatures with time, `LTV_*` and `PSV_*` for the
//! long-term validation process and `CTX_*` for the trust resolver.

// -- identification of the signing certificate --

/// Is there an identified candidate for the signing certificate?
pub const BBB_ICS_ISCI: &str = "BBB_ICS_ISCI";

/// Is the signed attribute 'signing-certificate' present?
pub const BBB_ICS_ISASCP: &str = "BBB_ICS_ISASCP";

/// Does the digest in 'signing-certificate' match a candidate?
pub const BBB_ICS_ICDVV: &str = "BBB_ICS_ICDVV";

/// Is the signing certificate unambiguously identified?
pub const BBB_ICS_ISCU: &str = "BBB_ICS_ISCU";

// -- validation context initialization --

/// Is the signature policy known?
pub const BBB_VCI_ISPK: &str = "BBB_VCI_ISPK";

/// Is the signature policy document available?
pub const BBB_VCI_ISPA: &str = "BBB_VCI_ISPA";

/// Does the digest of the signature policy document match?
pub const BBB_VCI_ISPM: &str = "BBB_VCI_ISPM";

// -- cryptographic verification --

/// Has the reference data object been found?
pub const BBB_CV_IRDOF: &str = "BBB_CV_IRDOF";

/// Is the reference data object intact?
pub const BBB_CV_IRDOI: &str = "BBB_CV_IRDOI";

/// Is the signature intact?
pub const BBB_CV_ISI: &str = "BBB_CV_ISI";

/// Has the message imprint data been found?
pub const BBB_CV_TSP_IRDOF: &str = "BBB_CV_TSP_IRDOF";

/// Is the message imprint data intact?
pub const BBB_CV_TSP_IRDOI: &str = "BBB_CV_TSP_IRDOI";

// -- signature acceptance validation --

/// Is the signed attribute 'signing-time' present?
pub const BBB_SAV_ISQPSTP: &str = "BBB_SAV_ISQPSTP";

/// Is the signed attribute 'content-type' present?
pub const BBB_SAV_ISQPCTP: &str = "BBB_SAV_ISQPCTP";

/// Is there a content timestamp?
pub const BBB_SAV_ISQPCTSIP: &str = "BBB_SAV_ISQPCTSIP";

/// Is the commitment type indication acceptable?
pub const BBB_SAV_ISQPXTIP: &str = "BBB_SAV_ISQPXTIP";

/// Are the signature cryptographic constraints met?
pub const BBB_SAV_ASCCM: &str = "BBB_SAV_ASCCM";

/// Are the cryptographic constraints met for the reference digests?
pub const BBB_SAV_DMDCCM: &str = "BBB_SAV_DMDCCM";

// -- X.509 certificate validation --

/// Can the certificate chain be built till a trust anchor?
pub const BBB_XCV_CCCBB: &str = "BBB_XCV_CCCBB";

/// Does the certificate have the expected key usage?
pub const BBB_XCV_ISCGKU: &str = "BBB_XCV_ISCGKU";

/// Does the certificate have the expected extended key usage?
pub const BBB_XCV_ISCGEKU: &str = "BBB_XCV_ISCGEKU";

/// Is the issuing certificate a certification authority?
pub const BBB_XCV_ISCA: &str = "BBB_XCV_ISCA";

/// Is the path length constraint respected?
pub const BBB_XCV_IPLC: &str = "BBB_XCV_IPLC";

/// Is revocation data present for the certificate?
pub const BBB_XCV_IRDPFC: &str = "BBB_XCV_IRDPFC";

/// Is the certificate not revoked?
pub const BBB_XCV_ISCR: &str = "BBB_XCV_ISCR";

/// Is the revocation data fresh?
pub const BBB_XCV_RFC: &str = "BBB_XCV_RFC";

/// Is the validation time in the validity range of the certificate?
pub const BBB_XCV_ICTIVRSC: &str = "BBB_XCV_ICTIVRSC";

/// Are the cryptographic constraints met for the certificate signature?
pub const BBB_XCV_ICSCCM: &str = "BBB_XCV_ICSCCM";

// -- validation process for signatures with time --

/// Is the message imprint of the timestamp verified?
pub const ADEST_IMIVC: &str = "ADEST_IMIVC";

/// Is the timestamp validated?
pub const ADEST_ITVPC: &str = "ADEST_ITVPC";

/// Are the timestamps in the right order?
pub const ADEST_ROTVPIIC: &str = "ADEST_ROTVPIIC";

/// Is the revocation time posterior to best-signature-time?
pub const ADEST_IRTPTBST: &str = "ADEST_IRTPTBST";

/// Is best-signature-time after the issuance date of the signing certificate?
pub const ADEST_IBSVPTADC: &str = "ADEST_IBSVPTADC";

/// Is the signature algorithm reliable at best-signature-time?
pub const ADEST_IAVRBST: &str = "ADEST_IAVRBST";

/// Is the signing time within the allowed delay of best-signature-time?
pub const ADEST_ISTPTDABST: &str = "ADEST_ISTPTDABST";

// -- long-term validation --

/// Is the message imprint of the timestamp verified?
pub const LTV_IMIVC: &str = "LTV_IMIVC";

/// Is the timestamp validated?
pub const LTV_ITVPC: &str = "LTV_ITVPC";

/// Was the digest algorithm of the timestamp reliable at its generation time?
pub const LTV_IDARGT: &str = "LTV_IDARGT";

/// Is a proof of existence available for the signature?
pub const LTV_ABSV: &str = "LTV_ABSV";

// -- past signature validation --

/// Is the certificate chain valid at the proof of existence time?
pub const PSV_IPCVC: &str = "PSV_IPCVC";

/// Is the signature algorithm reliable at the proof of existence time?
pub const PSV_IPSVC: &str = "PSV_IPSVC";

// -- trust resolver --

/// The issuer certificate could not be found.
pub const CTX_ISSUER_NOT_FOUND: &str = "CTX_ISSUER_NOT_FOUND";

/// An AIA fetch failed.
pub const CTX_AIA_FAILURE: &str = "CTX_AIA_FAILURE";

/// A revocation source reported a failure.
pub const CTX_REVOCATION_FAILURE: &str = "CTX_REVOCATION_FAILURE";

/// No revocation data was found for the certificate.
pub const CTX_NO_REVOCATION: &str = "CTX_NO_REVOCATION";

/// A token could not be decoded and was dropped.
pub const CTX_MALFORMED_TOKEN: &str = "CTX_MALFORMED_TOKEN";

/// The signature policy document could not be retrieved.
pub const CTX_POLICY_UNAVAILABLE: &str = "CTX_POLICY_UNAVAILABLE";
