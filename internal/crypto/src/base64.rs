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

//! Base64 helpers used when OCSP payloads are written to the audit log.

use ::base64::{engine::general_purpose, Engine as _};

/// Encode a byte slice using the standard, padded Base64 alphabet.
pub fn encode(data: &[u8]) -> String {
    general_purpose::STANDARD.encode(data)
}

