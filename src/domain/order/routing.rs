use async_trait::async_trait;

use super::value_objects::{GeoPoint, RouteSummary};

/// Opaque routing provider (maps, directions), supplied by the embedding
/// application. The binary ships none, so route planning is library-only.
///
/// Called outside any store transaction since a transaction body may run
/// several times.
#[async_trait]
pub trait RoutePlanner: Send + Sync {
    async fn plan(&self, origin: GeoPoint, destination: GeoPoint) -> Result<RouteSummary, RoutingError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RoutingError {
    #[error("no route between the restaurant and the delivery address")]
    NoRoute,
}
