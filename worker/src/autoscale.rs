use crate::config::WorkerConfig;

/// Computes the next worker-count target, or `None` for no change.
/// Mirrors the decision table exactly: burst cap above 5x threshold,
/// aggressive step above 3x, normal step above threshold, shrink below
/// the down-threshold. Forward progress is guaranteed on scale-up (bumps
/// by at least one); scale-down only applies strictly below current.
pub fn evaluate_target(queue_len: i64, active: u32, cfg: &WorkerConfig) -> Option<u32> {
    if queue_len > cfg.scale_up_threshold && active < cfg.max_worker_count {
        let mut target = if queue_len > cfg.scale_up_threshold * 5 {
            cfg.max_worker_count
        } else if queue_len > cfg.scale_up_threshold * 3 {
            (active as f64 * cfg.worker_scale_factor * 1.5).ceil() as u32
        } else {
            (active as f64 * cfg.worker_scale_factor).ceil() as u32
        };

        if target > cfg.max_worker_count {
            target = cfg.max_worker_count;
        }
        if target <= active {
            target = active + 1;
        }
        return Some(target);
    }

    if queue_len < cfg.scale_down_threshold && active > cfg.min_worker_count {
        let mut target = (active as f64 / cfg.worker_scale_factor).floor() as u32;
        if target < cfg.min_worker_count {
            target = cfg.min_worker_count;
        }
        if target < active {
            return Some(target);
        }
    }

    None
}

/// `true` when the backlog is severe enough to bypass cooldown.
pub fn is_emergency(queue_len: i64, active: u32, cfg: &WorkerConfig) -> bool {
    queue_len > cfg.scale_up_threshold * 5 && active < cfg.max_worker_count
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> WorkerConfig {
        WorkerConfig { min_worker_count: 1, max_worker_count: 10, ..WorkerConfig::default() }
    }

    #[test]
    fn burst_scales_to_max_above_5x_threshold() {
        let c = WorkerConfig { scale_up_threshold: 15, max_worker_count: 10, ..cfg() };
        assert_eq!(evaluate_target(200, 2, &c), Some(10));
    }

    #[test]
    fn aggressive_scale_above_3x_threshold() {
        let c = WorkerConfig { scale_up_threshold: 10, worker_scale_factor: 2.0, max_worker_count: 50, ..cfg() };
        // queue_len=35 > 30 (3x) but not > 50 (5x); active=4 -> ceil(4*2*1.5)=12
        assert_eq!(evaluate_target(35, 4, &c), Some(12));
    }

    #[test]
    fn normal_scale_above_threshold() {
        let c = WorkerConfig { scale_up_threshold: 10, worker_scale_factor: 2.0, max_worker_count: 50, ..cfg() };
        assert_eq!(evaluate_target(12, 4, &c), Some(8));
    }

    #[test]
    fn scale_up_guarantees_forward_progress() {
        // factor 1.0 means ceil(active*1.0) == active; must still bump by one.
        let c = WorkerConfig { scale_up_threshold: 10, worker_scale_factor: 1.0, max_worker_count: 50, ..cfg() };
        assert_eq!(evaluate_target(11, 4, &c), Some(5));
    }

    #[test]
    fn no_scale_up_once_at_max() {
        let c = WorkerConfig { scale_up_threshold: 10, max_worker_count: 4, ..cfg() };
        assert_eq!(evaluate_target(1000, 4, &c), None);
    }

    #[test]
    fn scale_down_below_threshold() {
        let c = WorkerConfig { scale_down_threshold: 5, worker_scale_factor: 2.0, min_worker_count: 1, ..cfg() };
        assert_eq!(evaluate_target(0, 8, &c), Some(4));
    }

    #[test]
    fn scale_down_never_below_min() {
        let c = WorkerConfig { scale_down_threshold: 5, worker_scale_factor: 2.0, min_worker_count: 1, ..cfg() };
        assert_eq!(evaluate_target(0, 1, &c), None);
    }

    #[test]
    fn stable_queue_produces_no_change() {
        let c = WorkerConfig { scale_up_threshold: 15, scale_down_threshold: 5, ..cfg() };
        assert_eq!(evaluate_target(8, 4, &c), None);
    }

    #[test]
    fn emergency_detection() {
        let c = WorkerConfig { scale_up_threshold: 15, max_worker_count: 10, ..cfg() };
        assert!(is_emergency(80, 2, &c));
        assert!(!is_emergency(80, 10, &c));
        assert!(!is_emergency(10, 2, &c));
    }
}
