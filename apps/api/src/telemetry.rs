//! View recording for project detail pages. Best-effort: a failed write is
//! logged and never affects the response.

use std::convert::Infallible;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap},
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::telemetry::NewViewRecord;
use crate::store::Store;

pub const FORWARDED_FOR: &str = "x-forwarded-for";
const UNKNOWN_IP: &str = "0.0.0.0";

/// The client's originating address: first hop of `X-Forwarded-For`,
/// else the TCP peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

pub fn resolve_client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get(FORWARDED_FOR)
        .and_then(|h| h.to_str().ok())
        .and_then(|chain| chain.split(',').next())
        .map(str::trim)
        .filter(|hop| !hop.is_empty());

    match (forwarded, peer) {
        (Some(hop), _) => hop.to_string(),
        (None, Some(addr)) => addr.ip().to_string(),
        (None, None) => UNKNOWN_IP.to_string(),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        Ok(ClientIp(resolve_client_ip(&parts.headers, peer)))
    }
}

/// Appends one view record. Every call writes a new row.
pub async fn record_view(store: &dyn Store, project_id: Uuid, user_id: Option<Uuid>, ip: ClientIp) {
    let view = NewViewRecord {
        project_id,
        user_id,
        ip_address: ip.0,
    };
    match store.record_view(view).await {
        Ok(record) => debug!("Recorded view {} of project {project_id}", record.id),
        Err(e) => warn!("Failed to record view of project {project_id}: {e}"),
    }
}
