use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct StatusUpdateRequest {
    #[schema(example = "PENDING_HEAD")]
    pub status: String,
}

/// Result of an applied transition.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatusChange {
    pub id: Uuid,
    #[schema(example = "proposed project")]
    pub entity: &'static str,
    #[schema(example = "PENDING_ADVISOR")]
    pub from: &'static str,
    #[schema(example = "PENDING_HEAD")]
    pub to: &'static str,
}
