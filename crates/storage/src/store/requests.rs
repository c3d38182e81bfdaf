#![forbid(unsafe_code)]

use hub_core::news::ValidatedNews;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishNewsRequest {
    pub news: ValidatedNews,
    pub created_by: String,
    pub created_at_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListArticlesRequest {
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListArticlesRequest {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}
