use std::time::Duration;

use metrics::{counter, histogram};

pub fn record_endpoint_probe(reachable: bool, duration: Duration) {
    let status = if reachable { "reachable" } else { "unreachable" };
    counter!("xabi_endpoint_probe_total", "status" => status).increment(1);
    histogram!("xabi_endpoint_probe_duration_seconds", "status" => status)
        .record(duration.as_secs_f64());
}

/// `outcome` is one of `probed`, `single`, `fallback` or `override`.
pub fn record_endpoint_selection(chain_id: u64, outcome: &str, probes: usize) {
    counter!(
        "xabi_endpoint_selection_total",
        "chain_id" => chain_id.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!(
        "xabi_endpoint_selection_probes",
        "chain_id" => chain_id.to_string(),
        "outcome" => outcome.to_string()
    )
    .record(probes as f64);
}

pub fn record_custom_endpoint_change(chain_id: u64, action: &str, status: &str) {
    counter!(
        "xabi_custom_endpoint_changes_total",
        "chain_id" => chain_id.to_string(),
        "action" => action.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
