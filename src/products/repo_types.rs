use rust_decimal::Decimal;
use sqlx::FromRow;
use time::OffsetDateTime;

/// Product row in the database.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct ProductRecord {
    pub id: i32,                            // assigned by the database on insert
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,                     // NUMERIC(18,2)
    pub stock_quantity: i32,
    pub category: String,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>, // NULL until the first mutation
    pub is_active: bool,                    // false once soft deleted
}
