use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Exhibition as seen by the pricing engine
///
/// Only the default rate matters for pricing; the rest is carried for
/// logging and responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Exhibition {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "Spring Trade Fair")]
    pub name: String,
    /// Default booth rate; booths cannot be priced per sqm without one
    #[schema(example = "100.00")]
    pub price_per_sqm: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Equipment catalog entry, priced per unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Equipment {
    #[schema(example = 5)]
    pub id: i32,
    #[schema(example = "SPOT-LED")]
    pub code_name: String,
    #[schema(example = "50.00")]
    pub price: Decimal,
}
