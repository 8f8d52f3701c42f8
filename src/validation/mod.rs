//! Request validation. Each check yields the first failing message as a 400.
//!
//! Schema-like endpoints use JSON-schema wording (`must have required property
//! 'x'`, `must be string`); onboarding uses friendlier sentences.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::database::as_i64;
use crate::error::ApiError;

static EMAIL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$").expect("email pattern"));

type Result<T> = std::result::Result<T, ApiError>;

pub fn required_property(body: &Value, props: &[&str]) -> Result<()> {
    for prop in props {
        if body.get(*prop).map_or(true, Value::is_null) {
            return Err(ApiError::bad_request(format!("must have required property '{}'", prop)));
        }
    }
    Ok(())
}

pub fn must_be_string(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| ApiError::bad_request("must be string"))
}

pub fn must_be_number(value: &Value) -> Result<f64> {
    value.as_f64().ok_or_else(|| ApiError::bad_request("must be number"))
}

pub fn must_be_boolean(value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| ApiError::bad_request("must be boolean"))
}

pub fn must_be_one_of(value: &Value, allowed: &[&str]) -> Result<()> {
    match value.as_str() {
        Some(s) if allowed.contains(&s) => Ok(()),
        _ => Err(ApiError::bad_request("must be equal to one of the allowed values")),
    }
}

/// Whole-number field of a JSON body.
pub fn int_field(body: &Value, key: &str) -> Option<i64> {
    body.get(key).and_then(as_i64)
}

/// True for `{}`, `null` and missing bodies.
pub fn is_empty_body(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Integer ids from a JSON array; `None` when any entry is not a whole number.
pub fn id_list(value: &Value) -> Option<Vec<i64>> {
    value.as_array()?.iter().map(as_i64).collect()
}

/// Numeric query parameter. Returns `Err(())` for present but non-numeric input.
pub fn numeric_param(raw: Option<&str>) -> std::result::Result<Option<i64>, ()> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<i64>().map(Some).map_err(|_| ()),
    }
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL.is_match(email)
}

/// Registration and createUser payload after validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub language: Option<String>,
}

fn text<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
}

pub fn validate_new_user(body: &Value) -> Result<NewUser> {
    let bad = |msg: &str| Err(ApiError::bad_request(msg));

    let Some(first_name) = text(body, "first_name") else { return bad("Please provide your first name") };
    if first_name.chars().count() < 2 {
        return bad("First name must be at least 2-character long");
    }
    let Some(last_name) = text(body, "last_name") else { return bad("Please provide your last name") };
    if last_name.chars().count() < 2 {
        return bad("Last name must be at least 2-character long");
    }
    let Some(email) = text(body, "email") else { return bad("Please provide your email") };
    let Some(password) = body.get("password").and_then(Value::as_str).filter(|p| !p.is_empty()) else {
        return bad("Please provide your password");
    };
    if password.chars().count() < 6 {
        return bad("Password should be at least 6-character long");
    }
    if password.matches('$').count() > 2 {
        return bad("Your password cannot contain more than three times the symbol `$`");
    }
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_upper = password.chars().any(char::is_uppercase);
    let has_lower = password.chars().any(char::is_lowercase);
    if !(has_digit && has_upper && has_lower) {
        return bad("Password should have numbers, upper characters and lower characters");
    }
    if !is_valid_email(email) {
        return bad("Please provide valid email address");
    }

    Ok(NewUser {
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: email.to_lowercase(),
        password: password.to_string(),
        language: text(body, "language").map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message(body: Value) -> String {
        validate_new_user(&body).unwrap_err().message().to_string()
    }

    #[test]
    fn new_user_checks_run_in_order() {
        assert_eq!(message(json!({})), "Please provide your first name");
        assert_eq!(message(json!({"first_name": "A"})), "First name must be at least 2-character long");
        assert_eq!(message(json!({"first_name": "Ann"})), "Please provide your last name");
        assert_eq!(message(json!({"first_name": "Ann", "last_name": "Lee"})), "Please provide your email");
        assert_eq!(
            message(json!({"first_name": "Ann", "last_name": "Lee", "email": "x"})),
            "Please provide your password"
        );
        assert_eq!(
            message(json!({"first_name": "Ann", "last_name": "Lee", "email": "x", "password": "Ab1"})),
            "Password should be at least 6-character long"
        );
        assert_eq!(
            message(json!({"first_name": "Ann", "last_name": "Lee", "email": "x", "password": "A$b$1$c"})),
            "Your password cannot contain more than three times the symbol `$`"
        );
        assert_eq!(
            message(json!({"first_name": "Ann", "last_name": "Lee", "email": "x", "password": "abcdef1"})),
            "Password should have numbers, upper characters and lower characters"
        );
        assert_eq!(
            message(json!({"first_name": "Ann", "last_name": "Lee", "email": "x", "password": "Abcdef1"})),
            "Please provide valid email address"
        );
    }

    #[test]
    fn new_user_accepts_valid_payload() {
        let user = validate_new_user(&json!({
            "first_name": "Ann", "last_name": "Lee", "email": "Ann@Example.com", "password": "Abcdef1", "language": "zh-HK"
        }))
        .unwrap();
        assert_eq!(user.email, "ann@example.com");
        assert_eq!(user.language.as_deref(), Some("zh-HK"));
    }

    #[test]
    fn schema_wording() {
        let body = json!({"k": "a", "v": 1});
        assert_eq!(
            required_property(&body, &["k", "v", "tenant"]).unwrap_err().message(),
            "must have required property 'tenant'"
        );
        assert_eq!(must_be_string(&body["v"]).unwrap_err().message(), "must be string");
        assert_eq!(must_be_number(&json!("1")).unwrap_err().message(), "must be number");
        assert!(must_be_one_of(&json!("Promotion"), &["Promotion"]).is_ok());
        assert!(must_be_one_of(&json!("promo"), &["Promotion"]).is_err());
    }

    #[test]
    fn params_and_lists() {
        assert_eq!(numeric_param(Some("12")), Ok(Some(12)));
        assert_eq!(numeric_param(None), Ok(None));
        assert_eq!(numeric_param(Some("abc")), Err(()));
        assert_eq!(id_list(&json!([1, 2])), Some(vec![1, 2]));
        assert_eq!(id_list(&json!([1, "2"])), None);
        assert!(is_empty_body(&json!({})));
        assert!(!is_empty_body(&json!({"id": 1})));
    }
}
