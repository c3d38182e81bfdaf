#![forbid(unsafe_code)]

use crate::error::CallableError;
use hub_core::ids::NewsId;
use hub_core::objects::{image_extension, news_image_key};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt::Write as _;

type HmacSha256 = Hmac<Sha256>;

pub(crate) const DEFAULT_UPLOAD_TTL_SECS: i64 = 300;
const UPLOAD_METHOD: &str = "PUT";

/// Short-lived permission to write exactly one object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct UploadGrant {
    pub(crate) upload_url: String,
    pub(crate) object_key: String,
    pub(crate) content_type: String,
    pub(crate) expected_news_id: NewsId,
    pub(crate) expires_at_ms: i64,
    pub(crate) signature: String,
}

/// Signs upload credentials with HMAC-SHA256 keyed by the deployment's upload secret.
#[derive(Clone)]
pub(crate) struct UploadSigner {
    base_url: String,
    mac: HmacSha256,
    ttl_secs: i64,
}

impl std::fmt::Debug for UploadSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadSigner")
            .field("base_url", &self.base_url)
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl UploadSigner {
    pub(crate) fn new(
        base_url: String,
        secret: &str,
        ttl_secs: i64,
    ) -> Result<Self, hmac::digest::InvalidLength> {
        Ok(Self {
            base_url,
            mac: HmacSha256::new_from_slice(secret.as_bytes())?,
            ttl_secs,
        })
    }

    pub(crate) fn method(&self) -> &'static str {
        UPLOAD_METHOD
    }

    /// Grants an upload of one image for the article expected to receive `expected_news_id`.
    pub(crate) fn grant(
        &self,
        expected_news_id: NewsId,
        content_type: &str,
        now_ms: i64,
    ) -> Result<UploadGrant, CallableError> {
        let content_type = content_type.trim().to_ascii_lowercase();
        let Some(extension) = image_extension(&content_type) else {
            return Err(CallableError::invalid(format!(
                "Unsupported content type: {content_type}"
            )));
        };

        let object_key = news_image_key(expected_news_id, extension);
        let expires_at_ms = now_ms.saturating_add(self.ttl_secs.saturating_mul(1_000));
        let expires_at_secs = expires_at_ms / 1_000;
        let signature = self.sign(&object_key, &content_type, expires_at_secs);
        let upload_url = format!(
            "{}/{}?expires={}&contentType={}&signature={}",
            self.base_url,
            object_key,
            expires_at_secs,
            encode_query_value(&content_type),
            signature
        );

        Ok(UploadGrant {
            upload_url,
            object_key,
            content_type,
            expected_news_id,
            expires_at_ms,
            signature,
        })
    }

    /// Checks a presented signature for `object_key` and that it has not expired at `now_ms`.
    pub(crate) fn verify(
        &self,
        object_key: &str,
        content_type: &str,
        expires_at_secs: i64,
        signature: &str,
        now_ms: i64,
    ) -> bool {
        if now_ms / 1_000 > expires_at_secs {
            return false;
        }
        let expected = self.sign(object_key, content_type, expires_at_secs);
        constant_time_eq(expected.as_bytes(), signature.as_bytes())
    }

    fn sign(&self, object_key: &str, content_type: &str, expires_at_secs: i64) -> String {
        let expires = expires_at_secs.to_string();
        let mut mac = self.mac.clone();
        for (i, part) in [UPLOAD_METHOD, object_key, content_type, expires.as_str()]
            .into_iter()
            .enumerate()
        {
            if i > 0 {
                mac.update(b"\n");
            }
            mac.update(part.as_bytes());
        }

        let digest = mac.finalize().into_bytes();
        let mut out = String::with_capacity(64);
        for b in digest {
            let _ = write!(&mut out, "{:02x}", b);
        }
        out
    }
}

fn constant_time_eq(left: &[u8], right: &[u8]) -> bool {
    if left.len() != right.len() {
        return false;
    }
    left.iter()
        .zip(right)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn encode_query_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
            out.push(b as char);
        } else {
            let _ = write!(&mut out, "%{b:02X}");
        }
    }
    out
}
