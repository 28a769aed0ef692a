use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MembershipConfig {
    pub self_name: String,
    pub self_target: String,
    pub targets: Vec<String>,
    pub ping_retry_amount: u32,
    pub ping_retry_delay: Duration,
    pub broadcast_to_amount: usize,
}
