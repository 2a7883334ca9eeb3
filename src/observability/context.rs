//! Per-invocation logging context.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

/// What the caller knows about an invocation before it starts.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authenticated user, if any.
    pub user_id: Option<String>,
    /// Redacted summary of the input, logged with the start record.
    pub input_summary: Option<Value>,
    /// Extra fields copied into every record of the invocation.
    pub extra: Map<String, Value>,
}

impl RequestContext {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::default()
        }
    }

    pub fn with_input(mut self, summary: Value) -> Self {
        self.input_summary = Some(summary);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// Identity threaded through every record of one invocation.
///
/// Built once on entry; call sites derive enriched copies with
/// [`LogContext::with_field`] instead of mutating it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogContext {
    pub request_id: String,
    pub user_id: String,
    pub function_name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LogContext {
    /// Anonymous callers are logged as `"anonymous"`.
    pub fn new(function_name: impl Into<String>, request: &RequestContext) -> Self {
        Self {
            request_id: generate_request_id(),
            user_id: request
                .user_id
                .clone()
                .unwrap_or_else(|| "anonymous".to_string()),
            function_name: function_name.into(),
            extra: request.extra.clone(),
        }
    }

    pub fn with_field(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.clone();
        next.extra.insert(key.into(), value.into());
        next
    }
}

pub fn generate_request_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_context_from_request() {
        let request = RequestContext::for_user("u-1").with_extra("region", "asia-northeast3");
        let ctx = LogContext::new("suggestPoems", &request);

        assert_eq!(ctx.user_id, "u-1");
        assert_eq!(ctx.function_name, "suggestPoems");
        assert_eq!(ctx.extra["region"], "asia-northeast3");
        assert!(Uuid::parse_str(&ctx.request_id).is_ok());
    }

    #[test]
    fn test_request_ids_are_unique() {
        let request = RequestContext::default();
        let a = LogContext::new("f", &request);
        let b = LogContext::new("f", &request);
        assert_ne!(a.request_id, b.request_id);
        assert_eq!(a.user_id, "anonymous");
    }

    #[test]
    fn test_with_field_leaves_original_untouched() {
        let ctx = LogContext::new("f", &RequestContext::default());
        let enriched = ctx.with_field("cacheKey", "poems:sad");
        assert!(ctx.extra.is_empty());
        assert_eq!(enriched.extra["cacheKey"], "poems:sad");
        assert_eq!(enriched.request_id, ctx.request_id);
    }

    #[test]
    fn test_serializes_camel_case_and_flattens_extra() {
        let ctx = LogContext {
            request_id: "r".into(),
            user_id: "u".into(),
            function_name: "f".into(),
            extra: Map::new(),
        }
        .with_field("mood", "sad");
        assert_eq!(
            serde_json::to_value(&ctx).unwrap(),
            json!({"requestId": "r", "userId": "u", "functionName": "f", "mood": "sad"})
        );
    }
}
