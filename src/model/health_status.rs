use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Self-reported wellness tag captured when a session opens and closes.
///
/// Parsing is case-insensitive and also understands the field vocabulary
/// printed on the paper forms at the sites (`Bien`, `Regular`, `Mal`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    ToSchema,
)]
#[strum(ascii_case_insensitive)]
pub enum HealthStatus {
    #[strum(to_string = "Good", serialize = "Bien")]
    Good,
    #[strum(to_string = "Fair", serialize = "Regular")]
    Fair,
    #[strum(to_string = "Poor", serialize = "Mal")]
    Poor,
}
