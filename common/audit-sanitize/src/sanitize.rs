use common_audit_model::Audit;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static CONTROL_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").unwrap());
static MULTI_SPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static EMAIL_ALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z0-9.@_+\-]").unwrap());
static IP_ALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9.:]").unwrap());

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

/// Drop control bytes, trim, HTML-escape, collapse internal whitespace runs.
pub fn sanitize_string(input: &str) -> String {
    let stripped = CONTROL_CHARS.replace_all(input, "");
    let escaped = escape_html(stripped.trim());
    MULTI_SPACE.replace_all(&escaped, " ").into_owned()
}

/// `sanitize_string`, then keep only characters valid in an email address.
pub fn sanitize_email(email: &str) -> String {
    let base = sanitize_string(email);
    EMAIL_ALLOWED.replace_all(&base, "").into_owned()
}

/// `sanitize_string`, then keep only digits, `.` and `:`.
pub fn sanitize_ip(ip: &str) -> String {
    let base = sanitize_string(ip);
    IP_ALLOWED.replace_all(&base, "").into_owned()
}

/// Lowercase, then canonicalize via the known-alias table; anything
/// unrecognized (including empty) falls through to `development`.
pub fn sanitize_environment(env: &str) -> String {
    let base = sanitize_string(env).to_lowercase();
    match base.as_str() {
        "prod" | "production" => "production",
        "staging" | "stage" | "homolog" | "homologation" => "staging",
        "dev" | "development" => "development",
        "test" | "testing" => "testing",
        "local" => "local",
        _ => "development",
    }
    .to_string()
}

/// Recursively sanitize every string key and string value in a JSON tree;
/// numbers, booleans and null pass through untouched.
pub fn sanitize_json_value(value: Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_string(&s)),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (key, val) in map {
                let clean_key = sanitize_string(&key);
                out.insert(clean_key, sanitize_json_value(val));
            }
            Value::Object(out)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json_value).collect()),
        other => other,
    }
}

fn sanitize_json_field(value: &Value) -> Value {
    if value.is_null() {
        return value.clone();
    }
    sanitize_json_value(value.clone())
}

/// Applies every field-level sanitization pass to an `Audit` in place.
/// Idempotent: sanitizing an already-sanitized record is a no-op (R1).
pub fn sanitize_audit(audit: &mut Audit) {
    audit.path = sanitize_string(&audit.path);
    audit.identifier = sanitize_string(&audit.identifier);
    audit.user_email = sanitize_email(&audit.user_email);
    audit.user_name = sanitize_string(&audit.user_name);
    audit.user_type = sanitize_string(&audit.user_type);
    audit.tenant_id = sanitize_string(&audit.tenant_id);
    audit.ip = sanitize_ip(&audit.ip);
    audit.user_agent = sanitize_string(&audit.user_agent);
    audit.request_id = sanitize_string(&audit.request_id);
    audit.error_message = sanitize_string(&audit.error_message);
    audit.service_name = sanitize_string(&audit.service_name);
    audit.environment = sanitize_environment(&audit.environment);

    audit.roles = sanitize_json_field(&audit.roles);
    audit.query_params = sanitize_json_field(&audit.query_params);
    audit.path_params = sanitize_json_field(&audit.path_params);
    audit.request_body = sanitize_json_field(&audit.request_body);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_control_chars_and_collapses_whitespace() {
        let input = "  a\u{0001}b   c\u{007F}  ";
        assert_eq!(sanitize_string(input), "ab c");
    }

    #[test]
    fn html_escapes() {
        assert_eq!(sanitize_string("<script>"), "&lt;script&gt;");
    }

    #[test]
    fn email_keeps_only_allowed_chars() {
        assert_eq!(sanitize_email("a+b@c.com<script>"), "a+b@c.com");
    }

    #[test]
    fn ip_keeps_only_digits_dots_colons() {
        assert_eq!(sanitize_ip("  127.0.0.1; rm -rf"), "127.0.0.1");
    }

    #[test]
    fn environment_normalizes_aliases() {
        assert_eq!(sanitize_environment("PROD"), "production");
        assert_eq!(sanitize_environment("homolog"), "staging");
        assert_eq!(sanitize_environment("whatever"), "development");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let once = sanitize_string("  <b>hi</b>   there  ");
        let twice = sanitize_string(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn json_sanitizes_keys_and_string_values_only() {
        let v = serde_json::json!({"a\u{0001}": "<x>", "n": 5, "b": true});
        let cleaned = sanitize_json_value(v);
        let obj = cleaned.as_object().unwrap();
        assert!(obj.contains_key("a"));
        assert_eq!(obj["a"], serde_json::json!("&lt;x&gt;"));
        assert_eq!(obj["n"], serde_json::json!(5));
        assert_eq!(obj["b"], serde_json::json!(true));
    }
}
