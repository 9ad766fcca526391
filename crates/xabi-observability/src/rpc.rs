use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_rpc_call(chain_id: u64, operation: &str, status: &str, duration: Duration) {
    counter!(
        "xabi_rpc_total",
        "chain_id" => chain_id.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "xabi_rpc_duration_seconds",
        "chain_id" => chain_id.to_string(),
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}

pub fn record_rpc_retry(chain_id: u64, operation: &str) {
    counter!(
        "xabi_rpc_retries_total",
        "chain_id" => chain_id.to_string(),
        "operation" => operation.to_string()
    )
    .increment(1);
}

pub fn record_contract_read(chain_id: u64, status: &str, duration: Duration) {
    counter!(
        "xabi_contract_read_total",
        "chain_id" => chain_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    histogram!(
        "xabi_contract_read_duration_seconds",
        "chain_id" => chain_id.to_string(),
        "status" => status.to_string()
    )
    .record(duration.as_secs_f64());
}
