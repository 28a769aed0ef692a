use std::time::Duration;

#[derive(Debug, Clone)]
pub struct SampleConfig {
    pub self_name: String,
    pub push_sample_to_amount: usize,
    pub push_sample_retry_amount: u32,
    pub push_sample_retry_delay: Duration,
    pub cleanup_nodes: bool,
    pub cleanup_samples: bool,
    pub cleanup_max_age: Duration,
}
