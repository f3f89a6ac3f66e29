use common_audit_queue::DEFAULT_QUEUE_NAME;
use std::str::FromStr;
use std::time::Duration;

/// Immutable pool configuration, loaded once at boot. Most variables accept
/// a short name or a legacy `BATAUDIT_`-prefixed alias, short name first.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub initial_worker_count: u32,
    pub min_worker_count: u32,
    pub max_worker_count: u32,
    pub max_retries: u32,
    pub poll_duration: Duration,
    pub enable_autoscaling: bool,
    pub scale_up_threshold: i64,
    pub scale_down_threshold: i64,
    pub worker_scale_factor: f64,
    pub cooldown_period: Duration,
    pub redis_address: String,
    pub queue_name: String,
}

fn env_or(primary: &str, legacy: &str) -> Option<String> {
    std::env::var(primary)
        .ok()
        .filter(|v| !v.is_empty())
        .or_else(|| std::env::var(legacy).ok().filter(|v| !v.is_empty()))
}

fn parse_env<T: FromStr>(primary: &str, legacy: &str, default: T) -> T {
    env_or(primary, legacy).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn parse_bool_env(primary: &str, legacy: &str, default: bool) -> bool {
    match env_or(primary, legacy).as_deref() {
        Some("true") | Some("1") | Some("yes") | Some("y") | Some("on") => true,
        Some("false") | Some("0") | Some("no") | Some("n") | Some("off") => false,
        _ => default,
    }
}

/// Accepts a bare integer (seconds), or a Go-`time.ParseDuration`-shaped
/// suffix: `500ms`, `2s`, `1m`.
fn parse_duration_env(primary: &str, legacy: &str, default: Duration) -> Duration {
    match env_or(primary, legacy) {
        None => default,
        Some(raw) => parse_duration_str(&raw).unwrap_or(default),
    }
}

fn parse_duration_str(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    if let Some(digits) = raw.strip_suffix("ms") {
        return digits.parse::<u64>().ok().map(Duration::from_millis);
    }
    if let Some(digits) = raw.strip_suffix('s') {
        return digits.parse::<f64>().ok().map(Duration::from_secs_f64);
    }
    if let Some(digits) = raw.strip_suffix('m') {
        return digits.parse::<u64>().ok().map(|m| Duration::from_secs(m * 60));
    }
    raw.parse::<u64>().ok().map(Duration::from_secs)
}

impl WorkerConfig {
    pub fn from_env() -> Self {
        Self {
            initial_worker_count: parse_env("WORKER_INITIAL_COUNT", "BATAUDIT_INITIAL_WORKER_COUNT", 2),
            min_worker_count: parse_env("WORKER_MIN_COUNT", "BATAUDIT_MIN_WORKER_COUNT", 1),
            max_worker_count: parse_env("WORKER_MAX_COUNT", "BATAUDIT_MAX_WORKER_COUNT", 10),
            max_retries: parse_env("WORKER_MAX_RETRIES", "BATAUDIT_MAX_RETRIES", 3),
            poll_duration: parse_duration_env("WORKER_POLL_DURATION", "BATAUDIT_POLL_DURATION", Duration::from_secs(1)),
            enable_autoscaling: parse_bool_env("ENABLE_AUTOSCALING", "BATAUDIT_ENABLE_AUTOSCALING", true),
            scale_up_threshold: parse_env("SCALE_UP_THRESHOLD", "BATAUDIT_SCALE_UP_THRESHOLD", 15),
            scale_down_threshold: parse_env("SCALE_DOWN_THRESHOLD", "BATAUDIT_SCALE_DOWN_THRESHOLD", 5),
            worker_scale_factor: parse_env("WORKER_SCALE_FACTOR", "BATAUDIT_WORKER_SCALE_FACTOR", 2.0),
            cooldown_period: parse_duration_env("COOLDOWN_PERIOD", "BATAUDIT_COOLDOWN_PERIOD", Duration::from_secs(15)),
            redis_address: env_or("REDIS_ADDRESS", "BATAUDIT_REDIS_ADDRESS").unwrap_or_else(|| "localhost:6379".into()),
            queue_name: env_or("QUEUE_NAME", "BATAUDIT_QUEUE_NAME").unwrap_or_else(|| DEFAULT_QUEUE_NAME.into()),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            initial_worker_count: 2,
            min_worker_count: 1,
            max_worker_count: 10,
            max_retries: 3,
            poll_duration: Duration::from_secs(1),
            enable_autoscaling: true,
            scale_up_threshold: 15,
            scale_down_threshold: 5,
            worker_scale_factor: 2.0,
            cooldown_period: Duration::from_secs(15),
            redis_address: "localhost:6379".into(),
            queue_name: DEFAULT_QUEUE_NAME.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_parses_suffixes() {
        assert_eq!(parse_duration_str("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration_str("2s"), Some(Duration::from_secs_f64(2.0)));
        assert_eq!(parse_duration_str("1m"), Some(Duration::from_secs(60)));
        assert_eq!(parse_duration_str("7"), Some(Duration::from_secs(7)));
    }
}
