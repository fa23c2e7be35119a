use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{FieldViolation, ValidationErrors};
use crate::products::repo_types::ProductRecord;

pub const NAME_MAX_LEN: usize = 200;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const CATEGORY_MAX_LEN: usize = 100;

pub const PRICE_SCALE: u32 = 2;
/// 0.01
pub const PRICE_MIN: Decimal = Decimal::from_parts(1, 0, 0, false, 2);
/// 999999.99
pub const PRICE_MAX: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Product as seen by callers of the catalog. Missing fields deserialize to
/// empty/zero values so `validate` can report them together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDto {
    #[serde(default)]
    pub id: i32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Decimal,
    #[serde(default)]
    pub stock_quantity: i32,
    #[serde(default)]
    pub category: String,
    #[serde(with = "time::serde::rfc3339", default = "unix_epoch")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339::option", default)]
    pub updated_at: Option<OffsetDateTime>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn unix_epoch() -> OffsetDateTime {
    OffsetDateTime::UNIX_EPOCH
}

fn default_active() -> bool {
    true
}

impl ProductDto {
    /// Checks the field constraints and reports every broken one.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut violations = Vec::new();

        if self.name.trim().is_empty() {
            violations.push(FieldViolation::new("name", "Product name is required"));
        } else if self.name.chars().count() > NAME_MAX_LEN {
            violations.push(FieldViolation::new(
                "name",
                format!("Name cannot exceed {NAME_MAX_LEN} characters"),
            ));
        }

        if let Some(description) = &self.description {
            if description.chars().count() > DESCRIPTION_MAX_LEN {
                violations.push(FieldViolation::new(
                    "description",
                    format!("Description cannot exceed {DESCRIPTION_MAX_LEN} characters"),
                ));
            }
        }

        if self.price < PRICE_MIN || self.price > PRICE_MAX {
            violations.push(FieldViolation::new(
                "price",
                format!("Price must be between {PRICE_MIN} and {PRICE_MAX}"),
            ));
        } else if self.price.normalize().scale() > PRICE_SCALE {
            // the column is NUMERIC(18,2); anything finer would be rounded on write
            violations.push(FieldViolation::new(
                "price",
                format!("Price cannot have more than {PRICE_SCALE} decimal places"),
            ));
        }

        if self.stock_quantity < 0 {
            violations.push(FieldViolation::new(
                "stock_quantity",
                "Stock quantity must be a positive number",
            ));
        }

        if self.category.trim().is_empty() {
            violations.push(FieldViolation::new("category", "Category is required"));
        } else if self.category.chars().count() > CATEGORY_MAX_LEN {
            violations.push(FieldViolation::new(
                "category",
                format!("Category cannot exceed {CATEGORY_MAX_LEN} characters"),
            ));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(violations))
        }
    }
}

impl From<ProductRecord> for ProductDto {
    fn from(r: ProductRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            description: r.description,
            price: r.price,
            stock_quantity: r.stock_quantity,
            category: r.category,
            created_at: r.created_at,
            updated_at: r.updated_at,
            is_active: r.is_active,
        }
    }
}

impl From<ProductDto> for ProductRecord {
    fn from(d: ProductDto) -> Self {
        Self {
            id: d.id,
            name: d.name,
            description: d.description,
            price: d.price,
            stock_quantity: d.stock_quantity,
            category: d.category,
            created_at: d.created_at,
            updated_at: d.updated_at,
            is_active: d.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedProductResponse {
    pub id: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ProductDto {
        ProductDto {
            id: 0,
            name: "Widget".into(),
            description: None,
            price: Decimal::new(999, 2),
            stock_quantity: 10,
            category: "Tools".into(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: None,
            is_active: true,
        }
    }

    #[test]
    fn valid_product_passes() {
        assert!(widget().validate().is_ok());
    }

    #[test]
    fn blank_product_reports_all_four_violations() {
        let dto = ProductDto {
            name: String::new(),
            price: Decimal::ZERO,
            stock_quantity: -1,
            category: String::new(),
            ..widget()
        };
        let errs = dto.validate().unwrap_err();
        let fields: Vec<_> = errs.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, ["name", "price", "stock_quantity", "category"]);
        assert_eq!(errs.violations()[0].message, "Product name is required");
        assert_eq!(
            errs.violations()[1].message,
            "Price must be between 0.01 and 999999.99"
        );
    }

    #[test]
    fn whitespace_only_name_is_missing() {
        let dto = ProductDto {
            name: "   ".into(),
            ..widget()
        };
        assert!(dto.validate().unwrap_err().has_field("name"));
    }

    #[test]
    fn length_limits_count_characters() {
        let dto = ProductDto {
            name: "é".repeat(NAME_MAX_LEN),
            description: Some("d".repeat(DESCRIPTION_MAX_LEN)),
            category: "c".repeat(CATEGORY_MAX_LEN),
            ..widget()
        };
        assert!(dto.validate().is_ok());

        let dto = ProductDto {
            name: "n".repeat(NAME_MAX_LEN + 1),
            description: Some("d".repeat(DESCRIPTION_MAX_LEN + 1)),
            category: "c".repeat(CATEGORY_MAX_LEN + 1),
            ..widget()
        };
        let errs = dto.validate().unwrap_err();
        assert!(errs.has_field("name"));
        assert!(errs.has_field("description"));
        assert!(errs.has_field("category"));
        assert_eq!(errs.violations().len(), 3);
    }

    #[test]
    fn price_bounds_are_inclusive() {
        for (price, ok) in [
            (Decimal::new(1, 2), true),
            (Decimal::new(99_999_999, 2), true),
            (Decimal::new(-500, 2), false),
            (Decimal::new(100_000_000, 2), false),
            (Decimal::new(1, 3), false),
        ] {
            let dto = ProductDto { price, ..widget() };
            assert_eq!(dto.validate().is_ok(), ok, "price {price}");
        }
    }

    #[test]
    fn price_with_more_than_two_decimals_is_rejected() {
        let dto = ProductDto {
            price: Decimal::new(9999, 3),
            ..widget()
        };
        let errs = dto.validate().unwrap_err();
        assert_eq!(errs.violations().len(), 1);
        assert_eq!(errs.violations()[0].field, "price");
        assert_eq!(
            errs.violations()[0].message,
            "Price cannot have more than 2 decimal places"
        );

        // trailing zeros are not extra precision
        let dto = ProductDto {
            price: Decimal::new(9990, 3),
            ..widget()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn missing_required_fields_become_violations() {
        let dto: ProductDto =
            serde_json::from_str(r#"{"price":0,"stock_quantity":-1}"#).unwrap();
        assert!(dto.name.is_empty());
        assert!(dto.category.is_empty());

        let errs = dto.validate().unwrap_err();
        let fields: Vec<_> = errs.violations().iter().map(|v| v.field).collect();
        assert_eq!(fields, ["name", "price", "stock_quantity", "category"]);

        let dto: ProductDto = serde_json::from_str("{}").unwrap();
        assert_eq!(dto.price, Decimal::ZERO);
        assert_eq!(dto.stock_quantity, 0);
        let errs = dto.validate().unwrap_err();
        assert!(errs.has_field("name"));
        assert!(errs.has_field("price"));
        assert!(errs.has_field("category"));
    }

    #[test]
    fn deserialize_fills_service_owned_fields() {
        let dto: ProductDto = serde_json::from_str(
            r#"{"name":"Widget","price":9.99,"stock_quantity":10,"category":"Tools"}"#,
        )
        .unwrap();
        assert_eq!(dto.id, 0);
        assert_eq!(dto.price, Decimal::new(999, 2));
        assert!(dto.is_active);
        assert!(dto.updated_at.is_none());
        assert!(dto.description.is_none());
    }

    #[test]
    fn serializes_timestamps_as_rfc3339() {
        let json = serde_json::to_value(widget()).unwrap();
        assert_eq!(json["created_at"], "1970-01-01T00:00:00Z");
        assert!(json["updated_at"].is_null());
        assert_eq!(json["price"], "9.99");
    }
}
