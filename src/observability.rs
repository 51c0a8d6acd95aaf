use std::net::SocketAddr;

use crate::engine::BookingError;

/// Counter: availability checks. Labels: verdict (free, conflict, invalid).
pub const CHECKS_TOTAL: &str = "innkeep_checks_total";

/// Histogram: availability check latency in seconds.
pub const CHECK_DURATION_SECONDS: &str = "innkeep_check_duration_seconds";

/// Counter: booking mutations. Labels: op (create, update, delete), status.
pub const MUTATIONS_TOTAL: &str = "innkeep_mutations_total";

/// Gauge: bookings currently held by the ledger.
pub const BOOKINGS_ACTIVE: &str = "innkeep_bookings_active";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a check result to its `verdict` label.
pub fn verdict_label<T>(result: &Result<Option<T>, BookingError>) -> &'static str {
    match result {
        Ok(None) => "free",
        Ok(Some(_)) => "conflict",
        Err(_) => "invalid",
    }
}

/// Map a mutation result to its `status` label.
pub fn status_label<T>(result: &Result<T, BookingError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels() {
        assert_eq!(verdict_label(&Ok::<Option<u8>, _>(None)), "free");
        assert_eq!(verdict_label(&Ok::<_, BookingError>(Some(1))), "conflict");
        assert_eq!(verdict_label::<u8>(&Err(BookingError::InvalidResource)), "invalid");
        assert_eq!(status_label(&Ok::<(), BookingError>(())), "ok");
        assert_eq!(status_label::<()>(&Err(BookingError::Forbidden)), "forbidden");
    }
}
