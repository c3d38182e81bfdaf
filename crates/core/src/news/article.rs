#![forbid(unsafe_code)]

use crate::ids::NewsId;
use serde::Serialize;

/// A published news article as persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: NewsId,
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub link: Option<String>,
    pub image_ref: Option<String>,
    pub created_at_ms: i64,
    pub created_by: String,
}
