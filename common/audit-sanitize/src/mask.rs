use common_audit_model::Audit;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CREDIT_CARD_DETECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:\d[ -]*){13,16}").unwrap());
static API_KEY_DETECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)key[-_]?[0-9a-zA-Z]{16,}").unwrap());
static SECRET_KEYWORD_DETECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)password|senha|secret").unwrap());

static CREDIT_CARD_MASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\d[ -]*){12}(?:\d[ -]*){4}").unwrap());
static PASSWORD_MASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"(password|senha|secret)"\s*:\s*"[^"]*""#).unwrap());
static TOKEN_MASK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)"(api[-_]?key|token|secret[-_]?key)"\s*:\s*"[^"]*""#).unwrap());

fn text_is_sensitive(text: &str) -> bool {
    CREDIT_CARD_DETECT.is_match(text)
        || API_KEY_DETECT.is_match(text)
        || SECRET_KEYWORD_DETECT.is_match(text)
}

fn value_text(value: &Value) -> Option<String> {
    if value.is_null() {
        None
    } else {
        Some(value.to_string())
    }
}

/// True if either `request_body` or `query_params` contains a credit-card
/// shaped digit run, an API-key shaped token, or a secret-related keyword.
pub fn detect_sensitive_data(audit: &Audit) -> bool {
    [&audit.request_body, &audit.query_params]
        .into_iter()
        .filter_map(value_text)
        .any(|text| text_is_sensitive(&text))
}

fn mask_text(text: &str) -> String {
    let masked = CREDIT_CARD_MASK.replace_all(text, |caps: &regex::Captures| {
        let matched = &caps[0];
        let digits: Vec<char> = matched.chars().filter(|c| c.is_ascii_digit()).collect();
        let last4: String = if digits.len() >= 16 {
            digits[12..16].iter().collect()
        } else {
            let start = digits.len().saturating_sub(4);
            digits[start..].iter().collect()
        };
        format!("************{last4}")
    });
    let masked = PASSWORD_MASK.replace_all(&masked, "\"$1\":\"********\"");
    let masked = TOKEN_MASK.replace_all(&masked, "\"$1\":\"********\"");
    masked.into_owned()
}

fn mask_value(value: &Value) -> Value {
    match value_text(value) {
        None => value.clone(),
        Some(text) => {
            let masked = mask_text(&text);
            serde_json::from_str(&masked).unwrap_or(Value::String(masked))
        }
    }
}

/// Masks `request_body` and `query_params` in place. Text substitution on
/// the serialized JSON string, not the parsed tree — see the design note on
/// why this trades a little accuracy for not disturbing key ordering.
/// Identity on a payload with no sensitive data (R2).
pub fn mask_sensitive_data(audit: &mut Audit) {
    audit.request_body = mask_value(&audit.request_body);
    audit.query_params = mask_value(&audit.query_params);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn audit_with_body(body: Value) -> Audit {
        use common_audit_model::HttpMethod;
        Audit {
            id: String::new(),
            request_id: String::new(),
            method: HttpMethod::Post,
            path: "/x".into(),
            status_code: 200,
            response_time_ms: 1,
            identifier: "u".into(),
            user_email: String::new(),
            user_name: String::new(),
            roles: Value::Null,
            user_type: String::new(),
            tenant_id: String::new(),
            ip: String::new(),
            user_agent: String::new(),
            query_params: Value::Null,
            path_params: Value::Null,
            request_body: body,
            error_message: String::new(),
            service_name: "svc".into(),
            environment: "production".into(),
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
        }
    }

    #[test]
    fn detects_card_number() {
        let a = audit_with_body(json!({"card": "4111 1111 1111 1111"}));
        assert!(detect_sensitive_data(&a));
    }

    #[test]
    fn detects_password_keyword() {
        let a = audit_with_body(json!({"password": "hunter2"}));
        assert!(detect_sensitive_data(&a));
    }

    #[test]
    fn no_detection_on_plain_payload() {
        let a = audit_with_body(json!({"name": "alice"}));
        assert!(!detect_sensitive_data(&a));
    }

    #[test]
    fn masks_card_number_keeping_last_four() {
        let mut a = audit_with_body(json!({"card": "4111111111111111"}));
        mask_sensitive_data(&mut a);
        let text = a.request_body.to_string();
        assert!(text.contains("************1111"));
        assert!(!text.contains("4111111111111111"));
    }

    #[test]
    fn masks_password_field() {
        let mut a = audit_with_body(json!({"password": "hunter2"}));
        mask_sensitive_data(&mut a);
        assert_eq!(a.request_body["password"], json!("********"));
    }

    #[test]
    fn masking_identity_on_clean_payload() {
        let mut a = audit_with_body(json!({"name": "alice"}));
        let before = a.request_body.clone();
        mask_sensitive_data(&mut a);
        assert_eq!(a.request_body, before);
    }
}
