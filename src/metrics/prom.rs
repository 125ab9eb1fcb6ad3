use lazy_static::lazy_static;
use prometheus::{labels, register_gauge, Gauge};

use certchecker::check::CheckResult;

lazy_static! {
    static ref CERTCHECKER_DAYS_BEFORE_EXPIRY: Gauge = register_gauge!(
        "certchecker_days_before_expiry",
        "days before certificate expiry"
    )
    .unwrap();
    static ref CERTCHECKER_CHECK_STATUS: Gauge = register_gauge!(
        "certchecker_check_status",
        "check status (0 OK, 1 WARNING, 2 ERROR, 3 UNKNOWN)"
    )
    .unwrap();
}

/// Pushes the outcome of one check to a Prometheus push gateway.
/// Fire-and-forget: a push failure is reported on stdout and never
/// changes the check verdict.
/// # Arguments
/// * `result` - The finished check result
/// * `days_left` - Days until expiry, when the certificate was retrieved
/// * `host` - The probed host, used as a label
/// * `prometheus_address` - Push gateway base address
pub fn push_check_metrics(
    result: &CheckResult,
    days_left: Option<i64>,
    host: &str,
    prometheus_address: &str,
) {
    if let Some(days) = days_left {
        CERTCHECKER_DAYS_BEFORE_EXPIRY.set(days as f64);
    }
    CERTCHECKER_CHECK_STATUS.set(f64::from(result.exit_code));

    let metric_families = prometheus::gather();
    let prometheus_client = prometheus::push_metrics(
        "certchecker",
        labels! {
            "instance".to_owned() => "certchecker".to_owned(),
            "job".to_owned() => "certchecker".to_owned(),
            "host".to_owned() => host.to_owned(),
            "status".to_owned() => result.status.to_string(),
        },
        &format!("{}/metrics/job", prometheus_address),
        metric_families,
        None,
    );

    match prometheus_client {
        Ok(_) => {}
        Err(e) => println!("\nFailed to push metrics to prometheus: {}", e),
    }
}
