use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub join_interval: Duration,
    pub ping_interval: Duration,
    pub push_sample_interval: Duration,
    pub cleanup_interval: Duration,
    pub rtt_interval: Duration,
}
