pub mod airports;
pub mod briefing;
pub mod cache;
pub mod health;
pub mod weather;

use std::sync::Arc;

use crate::errors::AppError;
use crate::helpers::{is_valid_icao, normalize_icao};
use crate::services::briefing::BriefingSynthesizer;
use crate::services::providers::gateway::ProviderGateway;

/// Shared state for weather, airport and briefing endpoints.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) gateway: Arc<ProviderGateway>,
    pub(crate) synthesizer: Arc<BriefingSynthesizer>,
}

/// Normalise an ICAO path or query parameter, rejecting malformed codes.
pub(crate) fn icao_param(raw: &str) -> Result<String, AppError> {
    let icao = normalize_icao(raw);
    if is_valid_icao(&icao) {
        Ok(icao)
    } else {
        Err(AppError::BadRequest(format!(
            "Invalid ICAO code '{}': expected 4 alphanumeric characters",
            raw
        )))
    }
}
