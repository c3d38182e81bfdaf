#![forbid(unsafe_code)]

pub mod link_safety;
pub mod news;

/// Wall clock shared by the store and the callable layer, in Unix epoch milliseconds.
pub mod clock {
    use std::time::{SystemTime, UNIX_EPOCH};

    /// Milliseconds since the Unix epoch; a clock set before 1970 reads as 0.
    pub fn now_ms() -> i64 {
        match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
            Err(_) => 0,
        }
    }
}

pub mod ids {
    use serde::Serialize;

    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
    #[serde(transparent)]
    pub struct NewsId(i64);

    impl NewsId {
        pub fn get(self) -> i64 {
            self.0
        }

        pub fn try_new(value: i64) -> Result<Self, NewsIdError> {
            if value < 1 {
                return Err(NewsIdError::NotPositive);
            }
            Ok(Self(value))
        }

        /// Id following `latest`, where `latest` is the counter value (0 when nothing was
        /// ever published).
        pub fn after(latest: i64) -> Result<Self, NewsIdError> {
            let next = latest.checked_add(1).ok_or(NewsIdError::Overflow)?;
            Self::try_new(next)
        }
    }

    impl std::fmt::Display for NewsId {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
    pub enum NewsIdError {
        #[error("news id must be a positive integer")]
        NotPositive,
        #[error("news id counter overflow")]
        Overflow,
    }
}

pub mod identity {
    /// Caller identity as established by the hosting platform's auth layer.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct CallerIdentity {
        uid: String,
        role: Option<String>,
    }

    impl CallerIdentity {
        pub fn try_new(
            uid: impl Into<String>,
            role: Option<String>,
        ) -> Result<Self, CallerIdentityError> {
            let uid = uid.into().trim().to_string();
            validate_uid(&uid)?;
            let role = role
                .map(|value| value.trim().to_ascii_lowercase())
                .filter(|value| !value.is_empty());
            Ok(Self { uid, role })
        }

        pub fn uid(&self) -> &str {
            &self.uid
        }

        pub fn role(&self) -> Option<&str> {
            self.role.as_deref()
        }
    }

    #[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
    pub enum CallerIdentityError {
        #[error("uid must not be empty")]
        Empty,
        #[error("uid is too long")]
        TooLong,
        #[error("uid contains control characters")]
        ContainsControl,
    }

    fn validate_uid(value: &str) -> Result<(), CallerIdentityError> {
        if value.is_empty() {
            return Err(CallerIdentityError::Empty);
        }
        if value.len() > 128 {
            return Err(CallerIdentityError::TooLong);
        }
        if value.chars().any(|c| c.is_control()) {
            return Err(CallerIdentityError::ContainsControl);
        }
        Ok(())
    }
}

pub mod objects {
    use crate::ids::NewsId;

    pub const NEWS_OBJECT_PREFIX: &str = "news";

    pub fn image_extension(content_type: &str) -> Option<&'static str> {
        match content_type.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/gif" => Some("gif"),
            _ => None,
        }
    }

    /// Object key an article's image is uploaded to: `news/{id}/image.{ext}`.
    pub fn news_image_key(id: NewsId, extension: &str) -> String {
        format!("{NEWS_OBJECT_PREFIX}/{id}/image.{extension}")
    }
}
