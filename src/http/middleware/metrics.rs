//! Per-request latency recording.

use std::time::Instant;

use axum::{
    body::Body,
    extract::MatchedPath,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::observability::metrics;

/// Record handler latency labelled by logical route.
pub async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let route = route_label(request.extensions().get::<MatchedPath>().map(MatchedPath::as_str));

    let response = next.run(request).await;
    metrics::record_request(route, response.status().as_u16(), start);
    response
}

/// Map a matched route template to a bounded label set.
fn route_label(matched: Option<&str>) -> &'static str {
    match matched {
        Some("/add") => "add",
        Some("/mappings") => "mappings",
        Some("/healthz") => "healthz",
        _ => "redirect",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_label() {
        assert_eq!(route_label(Some("/add")), "add");
        assert_eq!(route_label(Some("/mappings")), "mappings");
        assert_eq!(route_label(None), "redirect");
    }
}
