#![forbid(unsafe_code)]

use crate::error::CallableError;
use crate::server::{CallableResult, FunctionsServer, article_json, data_object};
use hub_core::ids::NewsId;
use hub_storage::ListArticlesRequest;
use serde_json::{Map, Value};

const MAX_LIST_LIMIT: usize = 100;

/// Article reads are public: neither call looks at the caller.
impl FunctionsServer {
    pub(crate) fn get_news(&self, data: &Value) -> CallableResult {
        let obj = data_object(data, false)?
            .ok_or_else(|| CallableError::invalid("data must be an object"))?;
        let id = news_id_arg(obj, "newsId")?;

        let article = self
            .store
            .get_article(id)?
            .ok_or_else(|| CallableError::NotFound(format!("News {id} not found")))?;

        let mut out = Map::new();
        out.insert("news".to_string(), article_json(&article)?);
        Ok(out)
    }

    pub(crate) fn list_news(&self, data: &Value) -> CallableResult {
        let obj = data_object(data, true)?;
        let defaults = ListArticlesRequest::default();
        let limit = usize_arg(obj, "limit")?.unwrap_or(defaults.limit);
        if limit == 0 || limit > MAX_LIST_LIMIT {
            return Err(CallableError::invalid(format!(
                "limit must be between 1 and {MAX_LIST_LIMIT}"
            )));
        }
        let offset = usize_arg(obj, "offset")?.unwrap_or(defaults.offset);

        let articles = self
            .store
            .list_articles(ListArticlesRequest { limit, offset })?;
        let news = articles
            .iter()
            .map(article_json)
            .collect::<Result<Vec<_>, _>>()?;

        let mut out = Map::new();
        out.insert("news".to_string(), Value::Array(news));
        Ok(out)
    }
}

pub(crate) fn news_id_arg(obj: &Map<String, Value>, key: &str) -> Result<NewsId, CallableError> {
    let raw = obj
        .get(key)
        .and_then(Value::as_i64)
        .ok_or_else(|| CallableError::invalid(format!("{key} must be a positive integer")))?;
    NewsId::try_new(raw)
        .map_err(|_| CallableError::invalid(format!("{key} must be a positive integer")))
}

fn usize_arg(obj: Option<&Map<String, Value>>, key: &str) -> Result<Option<usize>, CallableError> {
    let Some(value) = obj.and_then(|obj| obj.get(key)) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    value
        .as_u64()
        .and_then(|raw| usize::try_from(raw).ok())
        .map(Some)
        .ok_or_else(|| CallableError::invalid(format!("{key} must be a non-negative integer")))
}
