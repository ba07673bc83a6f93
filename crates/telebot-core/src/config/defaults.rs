pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_base_url() -> String {
    "https://api.telegram.org/".to_string()
}

pub(super) fn default_interval_ms() -> u64 {
    500
}

pub(super) fn default_timeout_secs() -> u64 {
    60
}

pub(super) fn default_poll_slack_secs() -> u64 {
    10
}

pub(super) fn default_max_attempts() -> u32 {
    5
}
