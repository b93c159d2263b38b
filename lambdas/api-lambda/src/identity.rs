use lambda_http::{Request, RequestExt};

/// Resolve the caller's user id.
///
/// Token signatures are checked by the API Gateway authorizer; here we only
/// read what it attached. HTTP APIs expose JWT claims (`sub`), Lambda
/// authorizers expose a `principalId`. When running offline, an `X-User-Id`
/// header stands in for the authorizer.
pub(crate) fn caller_id(event: &Request, allow_header_override: bool) -> Option<String> {
    if allow_header_override {
        let header = event
            .headers()
            .get("X-User-Id")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty());
        if let Some(user_id) = header {
            return Some(user_id.to_string());
        }
    }

    let authorizer = event.request_context_ref()?.authorizer()?;

    authorizer
        .jwt
        .as_ref()
        .and_then(|jwt| jwt.claims.get("sub"))
        .map(|s| s.to_string())
        .or_else(|| {
            authorizer
                .fields
                .get("principalId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
        })
        .filter(|s| !s.is_empty())
}
