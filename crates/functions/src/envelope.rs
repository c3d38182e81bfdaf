#![forbid(unsafe_code)]

use crate::error::CallableError;
use hub_core::news::FieldError;
use serde_json::{Map, Value, json};

pub(crate) fn callable_ok(result: Map<String, Value>) -> Value {
    let mut out = Map::new();
    out.insert("success".to_string(), Value::Bool(true));
    for (key, value) in result {
        if key != "success" {
            out.insert(key, value);
        }
    }
    Value::Object(out)
}

pub(crate) fn callable_error(err: &CallableError) -> Value {
    let mut error_obj = Map::new();
    error_obj.insert("code".to_string(), Value::String(err.code().to_string()));
    error_obj.insert(
        "message".to_string(),
        Value::String(err.to_string().trim().to_string()),
    );
    error_obj.insert("retryable".to_string(), Value::Bool(err.is_retryable()));

    if let CallableError::InvalidArgument {
        field_errors,
        reason,
        ..
    } = err
    {
        let mut details = Map::new();
        if !field_errors.is_empty() {
            details.insert(
                "fieldErrors".to_string(),
                Value::Array(field_errors.iter().map(field_error_json).collect()),
            );
        }
        if let Some(reason) = reason {
            details.insert("reason".to_string(), Value::String(reason.clone()));
        }
        if !details.is_empty() {
            error_obj.insert("details".to_string(), Value::Object(details));
        }
    }

    json!({
        "success": false,
        "error": Value::Object(error_obj)
    })
}

fn field_error_json(err: &FieldError) -> Value {
    json!({
        "field": err.field.as_str(),
        "code": err.reason.code(),
        "message": err.reason.message()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hub_core::news::{FieldErrorReason, NewsField};

    #[test]
    fn ok_envelope_is_flat() {
        let mut result = Map::new();
        result.insert("newsId".to_string(), json!(3));
        result.insert("success".to_string(), json!(false));
        assert_eq!(callable_ok(result), json!({ "success": true, "newsId": 3 }));
    }

    #[test]
    fn error_envelope_lists_field_errors() {
        let err = CallableError::InvalidArgument {
            message: "validation failed".to_string(),
            field_errors: vec![FieldError::new(
                NewsField::Title,
                FieldErrorReason::TooShort { min: 3, actual: 2 },
            )],
            reason: None,
        };
        assert_eq!(
            callable_error(&err),
            json!({
                "success": false,
                "error": {
                    "code": "INVALID_ARGUMENT",
                    "message": "validation failed",
                    "retryable": false,
                    "details": {
                        "fieldErrors": [{
                            "field": "title",
                            "code": "too_short",
                            "message": "length is too short (2 < 3 characters)"
                        }]
                    }
                }
            })
        );
    }

    #[test]
    fn aborted_is_retryable() {
        let envelope = callable_error(&CallableError::Aborted("busy".to_string()));
        assert_eq!(envelope["error"]["code"], "ABORTED");
        assert_eq!(envelope["error"]["retryable"], true);
        assert!(envelope["error"].get("details").is_none());
    }
}
