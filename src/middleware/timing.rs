use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

/// Tower-compatible middleware that adds two response headers:
///
///   X-Response-Time-Us  total handler wall time in microseconds
///   Server-Timing       same value in the standard Server-Timing format
///
/// and emits one access line per API request on the `http.access` target.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros();

    // ── Inject response headers ─────────────────────────────────
    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("x-response-time-us", val);
    }

    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("server-timing", val);
    }

    // ── Access log ──────────────────────────────────────────────
    // The SSE stream stays open for minutes; its duration is noise.
    if path.starts_with("/api/") && !path.ends_with("/stream") {
        tracing::debug!(
            target: "http.access",
            status = response.status().as_u16(),
            %method,
            path = %path,
            us = us as u64,
            "request"
        );
    }

    response
}
