mod mask;
mod sanitize;

pub use mask::{detect_sensitive_data, mask_sensitive_data};
pub use sanitize::{
    sanitize_audit, sanitize_email, sanitize_environment, sanitize_ip, sanitize_json_value,
    sanitize_string,
};
