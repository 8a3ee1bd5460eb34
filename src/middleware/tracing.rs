use std::time::Duration;

use tracing::{debug, info, warn};

use super::Middleware;
use crate::handler::{HandlerRequest, HandlerResponse};

/// Logs every request it wraps: one debug event on entry, one completion
/// event with status and latency (warn for 5xx).
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn before(&self, req: &HandlerRequest) -> Option<HandlerResponse> {
        debug!(
            request_id = %req.request_id,
            method = %req.method,
            path = %req.path,
            "Request started"
        );
        None
    }

    fn after(&self, req: &HandlerRequest, res: &mut HandlerResponse, latency: Duration) {
        let route = req.route_pattern.as_deref().unwrap_or("-");
        let latency_ms = latency.as_millis() as u64;
        if res.status >= 500 {
            warn!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                route = %route,
                status = res.status,
                latency_ms,
                "Request failed"
            );
        } else {
            info!(
                request_id = %req.request_id,
                method = %req.method,
                path = %req.path,
                route = %route,
                status = res.status,
                latency_ms,
                "Request completed"
            );
        }
    }
}
