#![forbid(unsafe_code)]

use crate::auth::{DEFAULT_PUBLISHER_ROLES, RoleAuthorizer};
use crate::upload::{DEFAULT_UPLOAD_TTL_SECS, UploadSigner};
use hub_core::link_safety::{DenyList, LinkSafetyChecker, ParseFailurePolicy};
use hub_storage::StoreOptions;
use sha2::Digest as _;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_STORAGE_DIR: &str = ".hub_data";
const DEFAULT_UPLOAD_BASE_URL: &str = "https://storage.local/upload";
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
pub(crate) const DEFAULT_MAX_REQUEST_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub(crate) enum ConfigError {
    #[error("missing value for {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {flag}: {value:?}")]
    InvalidValue { flag: &'static str, value: String },
}

#[derive(Clone, Debug)]
pub(crate) struct HubConfig {
    pub(crate) storage_dir: PathBuf,
    pub(crate) deny_list: DenyList,
    pub(crate) url_parse_policy: ParseFailurePolicy,
    pub(crate) publisher_roles: Vec<String>,
    pub(crate) upload_base_url: String,
    pub(crate) upload_secret: String,
    pub(crate) upload_secret_generated: bool,
    pub(crate) upload_ttl_secs: i64,
    pub(crate) busy_timeout_ms: u64,
    pub(crate) max_request_bytes: usize,
}

impl HubConfig {
    pub(crate) fn from_process() -> Result<Self, ConfigError> {
        let args = std::env::args().skip(1).collect::<Vec<_>>();
        Self::resolve(&args, |key| std::env::var(key).ok())
    }

    /// Resolves every setting from CLI flags first, then environment variables, then defaults.
    pub(crate) fn resolve(
        args: &[String],
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let storage_dir = last_flag(args, "--storage-dir")?
            .or_else(|| env("HUB_STORAGE_DIR"))
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));

        let deny_flags = flag_values(args, "--deny-domain")?;
        let deny_list = if !deny_flags.is_empty() {
            DenyList::new(deny_flags)
        } else if let Some(raw) = env("HUB_DENY_DOMAINS") {
            DenyList::new(split_list(&raw))
        } else {
            DenyList::default()
        };

        let url_parse_policy = match last_flag(args, "--url-parse-policy")?
            .or_else(|| env("HUB_URL_PARSE_POLICY"))
        {
            Some(raw) => ParseFailurePolicy::from_str(&raw).ok_or(ConfigError::InvalidValue {
                flag: "--url-parse-policy",
                value: raw,
            })?,
            None => ParseFailurePolicy::default(),
        };

        let role_flags = flag_values(args, "--publisher-role")?;
        let publisher_roles = if !role_flags.is_empty() {
            role_flags
        } else if let Some(raw) = env("HUB_PUBLISHER_ROLES") {
            split_list(&raw)
        } else {
            DEFAULT_PUBLISHER_ROLES
                .iter()
                .map(|role| role.to_string())
                .collect()
        };

        let upload_base_url = last_flag(args, "--upload-base-url")?
            .or_else(|| env("HUB_UPLOAD_BASE_URL"))
            .unwrap_or_else(|| DEFAULT_UPLOAD_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let (upload_secret, upload_secret_generated) = match env("HUB_UPLOAD_SECRET")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
        {
            Some(secret) => (secret, false),
            None => (ephemeral_secret(), true),
        };

        let upload_ttl_secs = parse_number(
            "--upload-ttl-secs",
            last_flag(args, "--upload-ttl-secs")?.or_else(|| env("HUB_UPLOAD_TTL_SECS")),
            DEFAULT_UPLOAD_TTL_SECS,
        )?;
        if upload_ttl_secs <= 0 {
            return Err(ConfigError::InvalidValue {
                flag: "--upload-ttl-secs",
                value: upload_ttl_secs.to_string(),
            });
        }

        let busy_timeout_ms = parse_number(
            "--busy-timeout-ms",
            last_flag(args, "--busy-timeout-ms")?.or_else(|| env("HUB_BUSY_TIMEOUT_MS")),
            DEFAULT_BUSY_TIMEOUT_MS,
        )?;

        let max_request_bytes = parse_number(
            "--max-request-bytes",
            last_flag(args, "--max-request-bytes")?.or_else(|| env("HUB_MAX_REQUEST_BYTES")),
            DEFAULT_MAX_REQUEST_BYTES,
        )?;
        if max_request_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "--max-request-bytes",
                value: max_request_bytes.to_string(),
            });
        }

        Ok(Self {
            storage_dir,
            deny_list,
            url_parse_policy,
            publisher_roles,
            upload_base_url,
            upload_secret,
            upload_secret_generated,
            upload_ttl_secs,
            busy_timeout_ms,
            max_request_bytes,
        })
    }

    pub(crate) fn store_options(&self) -> StoreOptions {
        StoreOptions {
            busy_timeout: Duration::from_millis(self.busy_timeout_ms),
        }
    }

    pub(crate) fn link_checker(&self) -> LinkSafetyChecker {
        LinkSafetyChecker::new(self.deny_list.clone(), self.url_parse_policy)
    }

    pub(crate) fn authorizer(&self) -> RoleAuthorizer {
        RoleAuthorizer::new(&self.publisher_roles)
    }

    pub(crate) fn upload_signer(&self) -> Result<UploadSigner, ConfigError> {
        UploadSigner::new(
            self.upload_base_url.clone(),
            &self.upload_secret,
            self.upload_ttl_secs,
        )
        .map_err(|_| ConfigError::InvalidValue {
            flag: "HUB_UPLOAD_SECRET",
            value: "<redacted>".to_string(),
        })
    }
}

/// Every value given for a repeatable flag, as `--flag value` or `--flag=value`.
fn flag_values(args: &[String], flag: &'static str) -> Result<Vec<String>, ConfigError> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == flag {
            let Some(value) = iter.next() else {
                return Err(ConfigError::MissingValue(flag));
            };
            out.push(value.clone());
        } else if let Some(value) = arg
            .strip_prefix(flag)
            .and_then(|rest| rest.strip_prefix('='))
        {
            out.push(value.to_string());
        }
    }
    Ok(out)
}

fn last_flag(args: &[String], flag: &'static str) -> Result<Option<String>, ConfigError> {
    Ok(flag_values(args, flag)?.pop())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_number<T: std::str::FromStr>(
    flag: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { flag, value: raw }),
        None => Ok(default),
    }
}

fn ephemeral_secret() -> String {
    let mut hasher = sha2::Sha256::new();
    hasher.update(std::process::id().to_le_bytes());
    hasher.update(hub_core::clock::now_ms().to_le_bytes());
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or_default();
    hasher.update(nanos.to_le_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(64);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}
