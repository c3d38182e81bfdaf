#![forbid(unsafe_code)]

use crate::auth::CallContext;
use crate::envelope::{callable_error, callable_ok};
use crate::error::CallableError;
use crate::server::{CallableResult, FunctionsServer};
use serde_json::Value;
use tracing::error;

pub(crate) const CALLABLE_NAMES: &[&str] = &[
    "publishNews",
    "getNewsUploadUrl",
    "attachNewsImage",
    "getNews",
    "listNews",
];

impl FunctionsServer {
    /// Runs one callable and wraps its outcome in the response envelope.
    pub(crate) fn dispatch_callable(
        &mut self,
        name: &str,
        ctx: &CallContext,
        data: Value,
    ) -> Value {
        match self.call(name, ctx, &data) {
            Ok(result) => callable_ok(result),
            Err(err) => {
                if matches!(err, CallableError::Internal(_)) {
                    error!(callable = name, error = %err, "callable failed");
                }
                callable_error(&err)
            }
        }
    }

    fn call(&mut self, name: &str, ctx: &CallContext, data: &Value) -> CallableResult {
        match name {
            "publishNews" => self.publish_news(ctx, data),
            "getNewsUploadUrl" => self.get_news_upload_url(ctx, data),
            "attachNewsImage" => self.attach_news_image(ctx, data),
            "getNews" => self.get_news(data),
            "listNews" => self.list_news(data),
            _ => Err(CallableError::NotFound(format!("Unknown function: {name}"))),
        }
    }
}
