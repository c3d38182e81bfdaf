#![forbid(unsafe_code)]

use crate::auth::CallContext;
use crate::error::CallableError;
use crate::server::{CallableResult, FunctionsServer, data_object};
use hub_core::news::{
    FieldError, FieldErrorReason, NewsDraft, NewsField, ValidatedNews, ValidationErrors,
};
use hub_storage::PublishNewsRequest;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Steps of one publish call, in order. Any failure ends the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PublishStage {
    Received,
    Validated,
    UrlChecked,
    Written,
}

impl PublishStage {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Validated => "validated",
            Self::UrlChecked => "url_checked",
            Self::Written => "written",
        }
    }
}

impl FunctionsServer {
    pub(crate) fn publish_news(&mut self, ctx: &CallContext, data: &Value) -> CallableResult {
        let caller = self.require_publisher(ctx)?;
        let mut stage = PublishStage::Received;
        debug!(stage = stage.as_str(), uid = caller.uid(), "publish news");

        let news = match read_draft(data).and_then(validate_draft) {
            Ok(news) => news,
            Err(err) => {
                debug!(stage = stage.as_str(), error = %err, "news rejected");
                return Err(err);
            }
        };
        stage = PublishStage::Validated;
        debug!(stage = stage.as_str(), "news validated");

        let verdict = self.link_checker.check(news.link());
        if !verdict.safe {
            let reason = verdict
                .reason
                .unwrap_or_else(|| "Unsafe link".to_string());
            warn!(stage = stage.as_str(), reason = %reason, "news link rejected");
            return Err(CallableError::InvalidArgument {
                message: format!("Unsafe link: {reason}"),
                field_errors: Vec::new(),
                reason: Some(reason),
            });
        }
        stage = PublishStage::UrlChecked;
        debug!(stage = stage.as_str(), link_checked = verdict.checked, "news link accepted");

        let article = self
            .store
            .publish_news(PublishNewsRequest {
                news,
                created_by: caller.uid().to_string(),
                created_at_ms: ctx.now_ms,
            })
            .map_err(|err| {
                warn!(
                    stage = stage.as_str(),
                    error = %err,
                    retryable = err.is_retryable(),
                    "news allocation failed"
                );
                CallableError::from(err)
            })?;
        stage = PublishStage::Written;
        debug!(stage = stage.as_str(), news_id = article.id.get(), "news stored");

        let mut out = Map::new();
        out.insert("newsId".to_string(), Value::from(article.id.get()));
        Ok(out)
    }
}

/// Builds a draft from callable data. Fields of the wrong JSON type are reported as
/// `not_a_string` and left out of the draft.
pub(crate) fn read_draft(data: &Value) -> Result<(NewsDraft, Vec<FieldError>), CallableError> {
    let obj = data_object(data, false)?
        .ok_or_else(|| CallableError::invalid("data must be an object"))?;
    let mut draft = NewsDraft::default();
    let mut type_errors = Vec::new();

    for field in NewsField::ALL {
        let value = match obj.get(field.as_str()) {
            None | Some(Value::Null) => None,
            Some(Value::String(value)) => Some(value.clone()),
            Some(_) => {
                type_errors.push(FieldError::new(field, FieldErrorReason::NotAString));
                continue;
            }
        };
        match field {
            NewsField::Title => draft.title = value,
            NewsField::Author => draft.author = value,
            NewsField::Description => draft.description = value,
            NewsField::Link => draft.link = value,
            NewsField::ImageUrl => draft.image_url = value,
        }
    }

    Ok((draft, type_errors))
}

fn validate_draft(
    (draft, type_errors): (NewsDraft, Vec<FieldError>),
) -> Result<ValidatedNews, CallableError> {
    if type_errors.is_empty() {
        return ValidatedNews::try_from_draft(draft).map_err(CallableError::from);
    }

    let mut errors = draft
        .validate()
        .into_iter()
        .filter(|err| !type_errors.iter().any(|bad| bad.field == err.field))
        .collect::<Vec<_>>();
    errors.extend(type_errors);
    errors.sort_by_key(|err| err.field);
    Err(CallableError::from(ValidationErrors(errors)))
}
