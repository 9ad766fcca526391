use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_signing_stage(chain_id: u64, stage: &str, status: &str, duration: Duration) {
    counter!(
        "xabi_signing_stage_total",
        "chain_id" => chain_id.to_string(),
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "xabi_signing_stage_duration_seconds",
        "chain_id" => chain_id.to_string(),
        "stage" => stage.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}
