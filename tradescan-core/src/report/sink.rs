//! Outbound collaborators: chart rendering and message delivery.
//!
//! The engine only produces inputs for these; artifact formats, transport,
//! authentication and rate limiting belong to the implementations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::BarSeries;
use crate::indicators::IndicatorSeries;

/// Opaque handle to a rendered artifact (path, URL, blob id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef(pub String);

impl ArtifactRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("message delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub trait ChartRenderer: Send + Sync {
    fn render(
        &self,
        bars: &BarSeries,
        indicators: &IndicatorSeries,
        label: &str,
    ) -> Result<ArtifactRef, SinkError>;
}

pub trait MessagingGateway: Send + Sync {
    fn deliver(&self, text: &str, artifact: Option<&ArtifactRef>) -> Result<(), SinkError>;
}
