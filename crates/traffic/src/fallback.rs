//! Detection of field-level authorization errors.
//!
//! The analytics API rejects fine-grained datasets on plans that do not
//! include them with an error scoped to the dataset's field. Matching on that
//! shape lives here and nowhere else.

use bastion_core::Granularity;
use serde_json::Value;

/// Error code the API attaches to authorization failures.
const AUTHZ_CODE: &str = "authz";

/// Message fragment of an authorization failure without a code.
const ACCESS_DENIED_FRAGMENT: &str = "does not have access";

/// True when `body` carries an authorization error naming the field queried at
/// `granularity`.
pub fn is_field_access_denied(body: &Value, granularity: Granularity) -> bool {
    let field = granularity.field_name();
    body.get("errors")
        .and_then(Value::as_array)
        .is_some_and(|errors| {
            errors
                .iter()
                .any(|error| is_authz_error(error) && names_field(error, field))
        })
}

fn is_authz_error(error: &Value) -> bool {
    let code = error
        .pointer("/extensions/code")
        .and_then(Value::as_str)
        .is_some_and(|code| code.eq_ignore_ascii_case(AUTHZ_CODE));
    code || message(error).is_some_and(|m| m.contains(ACCESS_DENIED_FRAGMENT))
}

fn names_field(error: &Value, field: &str) -> bool {
    let in_path = error
        .get("path")
        .and_then(Value::as_array)
        .is_some_and(|path| path.iter().any(|segment| segment.as_str() == Some(field)));
    in_path || message(error).is_some_and(|m| m.contains(field))
}

fn message(error: &Value) -> Option<&str> {
    error.get("message").and_then(Value::as_str)
}
