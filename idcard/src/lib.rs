// Copyright 2024 Adobe. All rights reserved.
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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg, doc_cfg_hide))]

pub mod audit;
pub use audit::{AuditSink, LogAuditSink, AUDIT_LOG_TARGET};

pub mod certificate;
pub use certificate::{Certificate, CertificateError};

pub mod config;
pub use config::{ConfigError, IdCardConfig, OcspEndpointConfig};

mod error;
pub use error::{ErrorCode, OcspError, Unavailable, ValidationFailure};

pub mod request;
pub use request::{CertificateId, OcspRequest};

pub mod resolver;
pub use resolver::{ConfiguredEndpointResolver, EndpointPolicyResolver};

pub mod response;
pub use response::{CertStatus, OcspResponse, ResponderId, ResponseValidator, SingleResponse};

pub mod transport;
pub use transport::{HttpTransport, OcspTransport, TransportError};

pub mod trust_store;
pub use trust_store::{TrustStoreError, TrustedCertificates};

mod validator;
pub use validator::{Clock, OcspValidator};

#[cfg(test)]
pub(crate) mod tests;
