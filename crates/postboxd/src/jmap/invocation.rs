//! JMAP request and response envelopes.
//!
//! A request body is a JSON array of `[methodName, arguments, callId]`
//! triples; the response mirrors it with `[responseName, result, callId]`.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::RouteError;

/// Name of a requested method, for example `getMailboxes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodName(String);

impl MethodName {
    /// Wraps a method name as sent by the client.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client token correlating an invocation with its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MethodCallId(String);

impl MethodCallId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MethodCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One `[methodName, arguments, callId]` triple.
///
/// Arguments stay opaque until the method processor parses them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invocation(MethodName, Value, MethodCallId);

impl Invocation {
    /// Builds a `[method, arguments, callId]` triple.
    pub fn new(method: MethodName, arguments: Value, call_id: MethodCallId) -> Self {
        Self(method, arguments, call_id)
    }

    pub fn method_name(&self) -> &MethodName {
        &self.0
    }

    pub fn arguments(&self) -> &Value {
        &self.1
    }

    pub fn call_id(&self) -> &MethodCallId {
        &self.2
    }
}

/// One `[responseName, result, callId]` triple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvocationResult(String, Value, MethodCallId);

impl InvocationResult {
    /// Response name used for failed invocations.
    pub const ERROR: &'static str = "error";

    pub fn new(name: impl Into<String>, result: Value, call_id: MethodCallId) -> Self {
        Self(name.into(), result, call_id)
    }

    /// Builds an `error` result.
    pub fn error(result: Value, call_id: MethodCallId) -> Self {
        Self::new(Self::ERROR, result, call_id)
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn result(&self) -> &Value {
        &self.1
    }

    pub fn call_id(&self) -> &MethodCallId {
        &self.2
    }

    /// Returns `true` for `error` results.
    pub fn is_error(&self) -> bool {
        self.0 == Self::ERROR
    }
}

/// Ordered invocations of one request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Batch {
    invocations: Vec<Invocation>,
}

impl Batch {
    pub fn new(invocations: Vec<Invocation>) -> Self {
        Self { invocations }
    }

    /// Decodes a request body.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError::BadRequest`] when the body is not an array of
    /// triples or an invocation's arguments are not a JSON object.
    ///
    /// Raw control characters inside string literals are tolerated and read
    /// as if they had been escaped.
    pub fn parse(body: &[u8]) -> Result<Self, RouteError> {
        let body = escape_control_characters(body);
        let invocations: Vec<Invocation> =
            serde_json::from_slice(&body).map_err(RouteError::from_json_error)?;
        if let Some(invocation) = invocations.iter().find(|inv| !inv.arguments().is_object()) {
            return Err(RouteError::bad_request(format!(
                "arguments of call '{}' must be an object",
                invocation.call_id()
            )));
        }
        Ok(Self { invocations })
    }

    pub fn invocations(&self) -> &[Invocation] {
        &self.invocations
    }

    /// Number of invocations in the batch.
    pub fn len(&self) -> usize {
        self.invocations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invocations.is_empty()
    }
}

/// Rewrites raw U+0000..U+001F bytes inside string literals as `\u00XX`.
///
/// Borrows the input when nothing needs escaping. A control byte directly
/// after a backslash is left alone so the decoder still rejects it.
fn escape_control_characters(body: &[u8]) -> Cow<'_, [u8]> {
    let mut escaped: Option<Vec<u8>> = None;
    let mut in_string = false;
    let mut after_backslash = false;
    for (index, &byte) in body.iter().enumerate() {
        if in_string && !after_backslash && byte < 0x20 {
            let out = escaped.get_or_insert_with(|| body[..index].to_vec());
            out.extend_from_slice(format!("\\u{byte:04x}").as_bytes());
            continue;
        }
        if let Some(out) = escaped.as_mut() {
            out.push(byte);
        }
        if !in_string {
            in_string = byte == b'"';
        } else if after_backslash {
            after_backslash = false;
        } else if byte == b'\\' {
            after_backslash = true;
        } else if byte == b'"' {
            in_string = false;
        }
    }
    escaped.map_or(Cow::Borrowed(body), Cow::Owned)
}

/// Results of one batch, index-aligned with its invocations.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct BatchResult(Vec<InvocationResult>);

impl BatchResult {
    pub fn new(results: Vec<InvocationResult>) -> Self {
        Self(results)
    }

    pub fn results(&self) -> &[InvocationResult] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;
    use crate::pipeline::FailureKind;

    #[rstest]
    fn parses_ordered_triples() {
        let body = br##"[["getMailboxes", {}, "#0"], ["setMailboxes", {"create": {}}, "#1"]]"##;
        let batch = Batch::parse(body).expect("valid batch");
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.invocations()[0].method_name().as_str(), "getMailboxes");
        assert_eq!(batch.invocations()[1].call_id().as_str(), "#1");
        assert_eq!(batch.invocations()[1].arguments(), &json!({"create": {}}));
    }

    #[rstest]
    #[case(&b"not json"[..])]
    #[case(&b"{}"[..])]
    #[case(&br#"[["getMailboxes", {}]]"#[..])]
    #[case(&br##"[["getMailboxes", [], "#0"]]"##[..])]
    #[case(&br##"[["getMailboxes", {}, "#0", "extra"]]"##[..])]
    fn malformed_bodies_are_bad_requests(#[case] body: &[u8]) {
        let error = Batch::parse(body).expect_err("must be rejected");
        assert_eq!(error.kind(), FailureKind::BadRequest);
    }

    #[rstest]
    fn raw_control_characters_in_strings_are_accepted() {
        let body = b"[[\"getMailboxes\", {\"note\": \"line\none\"}, \"c\t1\"]]";
        let batch = Batch::parse(body).expect("lenient batch");
        assert_eq!(batch.invocations()[0].call_id().as_str(), "c\t1");
        assert_eq!(
            batch.invocations()[0].arguments(),
            &json!({"note": "line\none"})
        );
    }

    #[rstest]
    #[case(&b"[\n  [\"getMailboxes\",\t{}, \"c1\"]\r\n]"[..], "c1")]
    #[case(&br#"[["getMailboxes", {}, "a\"b"]]"#[..], "a\"b")]
    #[case(&b"[[\"getMailboxes\", {}, \"q\\\\\x01\"]]"[..], "q\\\u{1}")]
    fn escaping_respects_json_structure(#[case] body: &[u8], #[case] call_id: &str) {
        let batch = Batch::parse(body).expect("valid batch");
        assert_eq!(batch.invocations()[0].call_id().as_str(), call_id);
    }

    #[rstest]
    fn strict_bodies_are_not_copied() {
        let body = br#"[["getMailboxes", {}, "c1"]]"#;
        assert!(matches!(escape_control_characters(body), Cow::Borrowed(_)));
    }

    #[rstest]
    fn empty_batch_is_valid() {
        assert!(Batch::parse(b"[]").expect("valid").is_empty());
    }

    #[rstest]
    fn results_serialize_as_triples() {
        let result = BatchResult::new(vec![InvocationResult::new(
            "mailboxes",
            json!({"list": []}),
            MethodCallId::new("c1"),
        )]);
        assert_eq!(
            serde_json::to_value(&result).expect("serialize"),
            json!([["mailboxes", {"list": []}, "c1"]])
        );
    }
}
