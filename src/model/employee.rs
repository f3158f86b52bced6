use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const ACTIVE_STATUS: &str = "active";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "national_id": "1032456789",
        "full_name": "Juan Perez",
        "position": "Driller",
        "status": "active"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "1032456789")]
    pub national_id: String,

    #[schema(example = "Juan Perez")]
    pub full_name: String,

    #[schema(example = "Driller", nullable = true)]
    pub position: Option<String>,

    #[schema(example = "active")]
    pub status: String,
}

impl Employee {
    pub fn is_active(&self) -> bool {
        self.status.eq_ignore_ascii_case(ACTIVE_STATUS)
    }

    /// Compares a typed name against the registered one, ignoring case and
    /// repeated whitespace.
    pub fn name_matches(&self, typed: &str) -> bool {
        normalize_name(&self.full_name) == normalize_name(typed)
    }
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(|part| part.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}
