#![forbid(unsafe_code)]

use crate::auth::CallContext;
use crate::error::CallableError;
use crate::reads::news_id_arg;
use crate::server::{CallableResult, FunctionsServer, article_json, data_object};
use crate::time::rfc3339_from_ms;
use hub_core::ids::NewsId;
use hub_core::objects::{image_extension, news_image_key};
use serde_json::{Map, Value};
use tracing::{info, warn};

impl FunctionsServer {
    /// Issues an upload credential for the image of the article the next publish will create.
    pub(crate) fn get_news_upload_url(&self, ctx: &CallContext, data: &Value) -> CallableResult {
        let caller = self.require_publisher(ctx)?;
        let obj = data_object(data, false)?
            .ok_or_else(|| CallableError::invalid("data must be an object"))?;
        let content_type = str_arg(obj, "contentType")?;

        let latest = self.store.latest_news_id()?;
        let expected = NewsId::after(latest)
            .map_err(|err| CallableError::Internal(format!("news id space exhausted: {err}")))?;
        let grant = self.upload_signer.grant(expected, content_type, ctx.now_ms)?;
        info!(
            uid = caller.uid(),
            object_key = %grant.object_key,
            expected_news_id = expected.get(),
            "upload url issued"
        );

        let mut out = Map::new();
        out.insert("uploadUrl".to_string(), Value::String(grant.upload_url));
        out.insert("objectKey".to_string(), Value::String(grant.object_key));
        out.insert(
            "expectedNewsId".to_string(),
            Value::from(grant.expected_news_id.get()),
        );
        out.insert(
            "expiresAt".to_string(),
            Value::String(rfc3339_from_ms(grant.expires_at_ms)?),
        );
        out.insert("contentType".to_string(), Value::String(grant.content_type));
        out.insert("expires".to_string(), Value::from(grant.expires_at_ms / 1_000));
        out.insert("signature".to_string(), Value::String(grant.signature));
        out.insert(
            "method".to_string(),
            Value::String(self.upload_signer.method().to_string()),
        );
        Ok(out)
    }

    /// Records an uploaded image on its article once the upload credential checks out.
    pub(crate) fn attach_news_image(&mut self, ctx: &CallContext, data: &Value) -> CallableResult {
        let caller = self.require_publisher(ctx)?;
        let obj = data_object(data, false)?
            .ok_or_else(|| CallableError::invalid("data must be an object"))?;
        let id = news_id_arg(obj, "newsId")?;
        let object_key = str_arg(obj, "objectKey")?;
        let content_type = str_arg(obj, "contentType")?.trim().to_ascii_lowercase();
        let expires = obj
            .get("expires")
            .and_then(Value::as_i64)
            .ok_or_else(|| CallableError::invalid("expires must be an integer"))?;
        let signature = str_arg(obj, "signature")?;

        let Some(extension) = image_extension(&content_type) else {
            return Err(CallableError::invalid(format!(
                "Unsupported content type: {content_type}"
            )));
        };
        if object_key != news_image_key(id, extension) {
            return Err(CallableError::invalid(
                "objectKey does not belong to this news item",
            ));
        }
        if !self
            .upload_signer
            .verify(object_key, &content_type, expires, signature, ctx.now_ms)
        {
            warn!(uid = caller.uid(), object_key, "upload credential rejected");
            return Err(CallableError::PermissionDenied(
                "Upload credential is invalid or expired".to_string(),
            ));
        }

        let article = self.store.set_article_image(id, object_key)?;
        info!(news_id = id.get(), object_key, "news image attached");

        let mut out = Map::new();
        out.insert("news".to_string(), article_json(&article)?);
        Ok(out)
    }
}

fn str_arg<'a>(obj: &'a Map<String, Value>, key: &str) -> Result<&'a str, CallableError> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| CallableError::invalid(format!("{key} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_arguments_must_be_present_and_non_blank() {
        let obj = json!({ "a": "x", "b": "  ", "c": 3 });
        let obj = obj.as_object().unwrap();
        assert_eq!(str_arg(obj, "a").unwrap(), "x");
        for key in ["b", "c", "missing"] {
            assert_eq!(str_arg(obj, key).unwrap_err().code(), "INVALID_ARGUMENT");
        }
    }
}
