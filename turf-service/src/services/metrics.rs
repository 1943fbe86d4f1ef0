use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use prometheus::{register_int_counter_vec_with_registry, IntCounterVec, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static BOOKINGS_CREATED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec_with_registry!(
        "turf_bookings_created_total",
        "Booking requests by payment method and outcome",
        &["payment_method", "outcome"],
        REGISTRY
    )
    .expect("failed to register turf_bookings_created_total")
});

pub static PAYMENT_VERIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec_with_registry!(
        "turf_payment_verifications_total",
        "Payment verifications by path and outcome",
        &["path", "outcome"],
        REGISTRY
    )
    .expect("failed to register turf_payment_verifications_total")
});

pub static REFUND_DECISIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec_with_registry!(
        "turf_refund_decisions_total",
        "Refund requests decided, by decision and gateway outcome",
        &["decision", "gateway"],
        REGISTRY
    )
    .expect("failed to register turf_refund_decisions_total")
});

pub static PAYOUTS_MARKED: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec_with_registry!(
        "turf_payouts_marked_total",
        "Bookings marked as paid out to owners",
        &["mode"],
        REGISTRY
    )
    .expect("failed to register turf_payouts_marked_total")
});

/// Installs the global `metrics` recorder. Call once, from `main`.
pub fn init_metrics() {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        panic!("failed to set metrics handle: already initialized");
    }

    Lazy::force(&BOOKINGS_CREATED);
    Lazy::force(&PAYMENT_VERIFICATIONS);
    Lazy::force(&REFUND_DECISIONS);
    Lazy::force(&PAYOUTS_MARKED);
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    use prometheus::Encoder;
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer).ok();
    if let Ok(domain_metrics) = String::from_utf8(buffer) {
        output.push_str(&domain_metrics);
    }

    output
}

pub fn record_booking(payment_method: &str, outcome: &str) {
    BOOKINGS_CREATED
        .with_label_values(&[payment_method, outcome])
        .inc();
}

pub fn record_verification(path: &str, outcome: &str) {
    PAYMENT_VERIFICATIONS.with_label_values(&[path, outcome]).inc();
}

pub fn record_refund_decision(decision: &str, gateway: &str) {
    REFUND_DECISIONS.with_label_values(&[decision, gateway]).inc();
}

pub fn record_payouts(mode: &str, count: u64) {
    PAYOUTS_MARKED.with_label_values(&[mode]).inc_by(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_counters_render_without_recorder() {
        record_booking("online", "created");
        record_verification("gateway", "rejected");

        let text = get_metrics();
        assert!(text.contains("turf_bookings_created_total"));
        assert!(text.contains("turf_payment_verifications_total"));
    }
}
