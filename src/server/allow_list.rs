//! Peer address allow-list.
//!
//! Create and list are only served to allow-listed peers. Updates are not
//! checked: they are authorized by the record's `auth_hash` instead. The check
//! runs inside the handlers so create can answer the teapot probe first.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{extract::ConnectInfo, http::StatusCode};
use tracing::warn;

use super::error::AppError;

#[derive(Debug, Clone, Default)]
pub struct AllowList {
    addresses: Arc<Vec<IpAddr>>,
}

impl AllowList {
    pub fn new(addresses: Vec<IpAddr>) -> Self {
        Self {
            addresses: Arc::new(addresses),
        }
    }

    /// An empty list lets every peer through.
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Unknown peers are only admitted when the list is empty.
    pub fn permits(&self, peer: Option<IpAddr>) -> bool {
        if self.addresses.is_empty() {
            return true;
        }
        peer.is_some_and(|ip| self.addresses.contains(&ip.to_canonical()))
    }

    /// 403 for peers outside the list.
    pub fn check(&self, peer: &Option<ConnectInfo<SocketAddr>>) -> Result<(), AppError> {
        let ip = peer.as_ref().map(|ConnectInfo(addr)| addr.ip());
        if self.permits(ip) {
            return Ok(());
        }

        let shown = ip.map_or_else(|| "unknown".to_string(), |ip| ip.to_string());
        warn!("Rejected request from {}", shown);
        Err(AppError::new(
            StatusCode::FORBIDDEN,
            format!("Your IP has not been whitelisted! ip: {shown}"),
        ))
    }
}
