//! Untrusted decoding of a compact JWS credential.
//!
//! Nothing here checks a signature. The decoded header is only used to pick the
//! verification key; the payload is kept to reject garbage early and for
//! diagnostics when verification fails.

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::Header;
use serde_json::{Map, Value};

use crate::services::auth::error::AuthError;

/// A credential whose segments decoded cleanly but whose signature is not yet checked.
#[derive(Debug, Clone)]
pub struct UnverifiedToken<'a> {
    raw: &'a str,
    header: Header,
    kid: String,
    claims: Map<String, Value>,
}

impl<'a> UnverifiedToken<'a> {
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    // Diagnostics only; nothing may be decided on these.
    pub fn untrusted_claims(&self) -> &Map<String, Value> {
        &self.claims
    }
}

/// Split `header.payload.signature` and decode the first two segments.
pub fn decode(raw: &str) -> Result<UnverifiedToken<'_>, AuthError> {
    if raw.is_empty() {
        return Err(AuthError::MalformedCredential("empty credential"));
    }

    let segments: Vec<&str> = raw.split('.').collect();
    let [header_b64, payload_b64, signature_b64] = segments.as_slice() else {
        return Err(AuthError::MalformedCredential("expected three segments"));
    };
    if header_b64.is_empty() || payload_b64.is_empty() || signature_b64.is_empty() {
        return Err(AuthError::MalformedCredential("empty segment"));
    }

    let header: Header = decode_segment(header_b64)
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(AuthError::MalformedCredential("header"))?;

    let claims: Map<String, Value> = decode_segment(payload_b64)
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
        .ok_or(AuthError::MalformedCredential("payload"))?;

    let kid = header
        .kid
        .clone()
        .filter(|kid| !kid.is_empty())
        .ok_or(AuthError::MalformedCredential("header has no kid"))?;

    Ok(UnverifiedToken {
        raw,
        header,
        kid,
        claims,
    })
}

fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(segment).ok()
}
