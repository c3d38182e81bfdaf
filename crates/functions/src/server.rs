#![forbid(unsafe_code)]

use crate::auth::{Authorizer, CallContext, require_publisher};
use crate::error::CallableError;
use crate::upload::UploadSigner;
use hub_core::identity::CallerIdentity;
use hub_core::link_safety::LinkSafetyChecker;
use hub_core::news::Article;
use hub_storage::SqliteStore;
use serde_json::{Map, Value};

pub(crate) type CallableResult = Result<Map<String, Value>, CallableError>;

pub(crate) struct FunctionsServer {
    pub(crate) store: SqliteStore,
    pub(crate) link_checker: LinkSafetyChecker,
    pub(crate) authorizer: Box<dyn Authorizer>,
    pub(crate) upload_signer: UploadSigner,
}

impl FunctionsServer {
    pub(crate) fn new(
        store: SqliteStore,
        link_checker: LinkSafetyChecker,
        authorizer: Box<dyn Authorizer>,
        upload_signer: UploadSigner,
    ) -> Self {
        Self {
            store,
            link_checker,
            authorizer,
            upload_signer,
        }
    }

    pub(crate) fn require_publisher<'a>(
        &self,
        ctx: &'a CallContext,
    ) -> Result<&'a CallerIdentity, CallableError> {
        require_publisher(self.authorizer.as_ref(), ctx)
    }
}

pub(crate) fn data_object<'a>(
    data: &'a Value,
    allow_null: bool,
) -> Result<Option<&'a Map<String, Value>>, CallableError> {
    match data {
        Value::Object(obj) => Ok(Some(obj)),
        Value::Null if allow_null => Ok(None),
        _ => Err(CallableError::invalid("data must be an object")),
    }
}

pub(crate) fn article_json(article: &Article) -> Result<Value, CallableError> {
    let mut value = serde_json::to_value(article)
        .map_err(|err| CallableError::Internal(format!("serialize article: {err}")))?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert(
            "createdAt".to_string(),
            Value::String(crate::time::rfc3339_from_ms(article.created_at_ms)?),
        );
    }
    Ok(value)
}
