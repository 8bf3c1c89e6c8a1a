// src/types.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct BootstrapReq {
    pub nonce: String,
    pub device_pubkey: String,
}

#[derive(Debug, Serialize)]
pub struct BootstrapRes {
    pub device_token: String,
}

/// Out-of-band metadata carried in request headers.
#[derive(Debug, Clone, Default)]
pub struct BootstrapContext {
    pub build_id: String,
    pub timestamp: String,
    pub signature: String,
}

impl BootstrapContext {
    pub const BUILD_ID_HEADER: &'static str = "x-build-id";
    pub const TIMESTAMP_HEADER: &'static str = "x-timestamp";
    pub const SIGNATURE_HEADER: &'static str = "x-bootstrap-signature";

    /// Missing or non-UTF-8 headers become empty strings.
    pub fn from_headers(headers: &axum::http::HeaderMap) -> Self {
        let get = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        Self {
            build_id: get(Self::BUILD_ID_HEADER),
            timestamp: get(Self::TIMESTAMP_HEADER),
            signature: get(Self::SIGNATURE_HEADER),
        }
    }
}
