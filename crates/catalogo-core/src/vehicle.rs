//! Vehicle records, create/update payloads and listing filters.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::{CoreError, Result};
use crate::id::generate_id;
use crate::time::current_year;

pub const MIN_YEAR: i32 = 1900;

/// A stored catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub id: String,
    pub brand: String,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Vehicle {
    /// Builds a fresh record with a new id; both timestamps are `now`.
    pub fn from_new(new: NewVehicle, now: OffsetDateTime) -> Self {
        Self {
            id: generate_id(),
            brand: new.brand,
            vehicle_type: new.vehicle_type,
            year: new.year,
            model_name: new.model_name,
            description: new.description,
            color: new.color,
            price: new.price,
            image_url: new.image_url,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a patch into this record. `id` and `created_at` never change.
    pub fn apply(&mut self, patch: VehiclePatch, now: OffsetDateTime) {
        if let Some(brand) = patch.brand {
            self.brand = brand;
        }
        if let Some(vehicle_type) = patch.vehicle_type {
            self.vehicle_type = vehicle_type;
        }
        if let Some(year) = patch.year {
            self.year = year;
        }
        if patch.model_name.is_some() {
            self.model_name = patch.model_name;
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.color.is_some() {
            self.color = patch.color;
        }
        if patch.price.is_some() {
            self.price = patch.price;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        self.updated_at = now;
    }
}

/// Validated create payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub brand: String,
    pub vehicle_type: String,
    pub year: i32,
    pub model_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

impl NewVehicle {
    pub fn new(brand: impl Into<String>, vehicle_type: impl Into<String>, year: i32) -> Self {
        Self {
            brand: brand.into(),
            vehicle_type: vehicle_type.into(),
            year,
            model_name: None,
            description: None,
            color: None,
            price: None,
            image_url: None,
        }
    }

    pub fn with_model_name(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }

    /// Checks field rules and trims string fields.
    pub fn validate(self) -> Result<Self> {
        let patch = VehiclePatch::from(self).validate()?;
        NewVehicle::try_from(patch)
    }
}

impl TryFrom<VehiclePatch> for NewVehicle {
    type Error = CoreError;

    /// Requires the mandatory fields. Run [`VehiclePatch::validate`] first.
    fn try_from(patch: VehiclePatch) -> Result<Self> {
        Ok(Self {
            brand: patch
                .brand
                .ok_or_else(|| CoreError::invalid_field("brand", "is required"))?,
            vehicle_type: patch
                .vehicle_type
                .ok_or_else(|| CoreError::invalid_field("type", "is required"))?,
            year: patch
                .year
                .ok_or_else(|| CoreError::invalid_field("year", "is required"))?,
            model_name: patch.model_name,
            description: patch.description,
            color: patch.color,
            price: patch.price,
            image_url: patch.image_url,
        })
    }
}

impl From<NewVehicle> for VehiclePatch {
    fn from(new: NewVehicle) -> Self {
        Self {
            brand: Some(new.brand),
            vehicle_type: Some(new.vehicle_type),
            year: Some(new.year),
            model_name: new.model_name,
            description: new.description,
            color: new.color,
            price: new.price,
            image_url: new.image_url,
        }
    }
}

/// Request body for both create and update. Unknown fields (including
/// `id`, `createdAt`, `updatedAt`) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehiclePatch {
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub year: Option<i32>,
    pub model_name: Option<String>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub price: Option<f64>,
    pub image_url: Option<String>,
}

impl VehiclePatch {
    /// Validates every present field and trims strings.
    pub fn validate(self) -> Result<Self> {
        let brand = self.brand.map(|b| required_text("brand", b)).transpose()?;
        let vehicle_type = self
            .vehicle_type
            .map(|t| required_text("type", t))
            .transpose()?;

        if let Some(year) = self.year {
            let max = current_year() + 1;
            if !(MIN_YEAR..=max).contains(&year) {
                return Err(CoreError::invalid_field(
                    "year",
                    format!("must be between {MIN_YEAR} and {max}"),
                ));
            }
        }

        if let Some(price) = self.price
            && (!price.is_finite() || price < 0.0)
        {
            return Err(CoreError::invalid_field("price", "must be a non-negative number"));
        }

        Ok(Self {
            brand,
            vehicle_type,
            year: self.year,
            model_name: self.model_name.map(trim_owned),
            description: self.description.map(trim_owned),
            color: self.color.map(trim_owned),
            price: self.price,
            image_url: self.image_url.map(trim_owned),
        })
    }
}

/// Listing filter. Build with [`VehicleFilter::normalized`] before use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleFilter {
    pub brand: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,
    pub year: Option<i32>,
}

impl VehicleFilter {
    /// Trims values, drops blanks and lower-cases `brand`.
    pub fn normalized(self) -> Self {
        Self {
            brand: non_blank(self.brand).map(|b| b.to_lowercase()),
            vehicle_type: non_blank(self.vehicle_type),
            year: self.year,
        }
    }

    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    pub fn with_type(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = Some(vehicle_type.into());
        self
    }

    pub fn with_year(mut self, year: i32) -> Self {
        self.year = Some(year);
        self
    }

    /// Brand is compared case-insensitively, type and year exactly.
    pub fn matches(&self, vehicle: &Vehicle) -> bool {
        if let Some(brand) = &self.brand
            && vehicle.brand.to_lowercase() != brand.to_lowercase()
        {
            return false;
        }
        if let Some(vehicle_type) = &self.vehicle_type
            && vehicle.vehicle_type != *vehicle_type
        {
            return false;
        }
        if let Some(year) = self.year
            && vehicle.year != year
        {
            return false;
        }
        true
    }
}

/// Listing order: newest first, ties broken by id descending.
pub fn listing_order(a: &Vehicle, b: &Vehicle) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

fn required_text(field: &'static str, value: String) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid_field(field, "must not be blank"));
    }
    Ok(trimmed.to_string())
}

fn trim_owned(value: String) -> String {
    value.trim().to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    fn sample(brand: &str, vehicle_type: &str, year: i32) -> Vehicle {
        Vehicle::from_new(
            NewVehicle::new(brand, vehicle_type, year),
            datetime!(2024-01-01 00:00:00 UTC),
        )
    }

    #[test]
    fn test_from_new_sets_equal_timestamps() {
        let v = sample("Toyota", "Sedan", 2020);
        assert_eq!(v.created_at, v.updated_at);
        assert!(!v.id.is_empty());
    }

    #[test]
    fn test_json_uses_camel_case_and_type() {
        let v = sample("Toyota", "Sedan", 2020);
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["type"], "Sedan");
        assert!(json.get("createdAt").is_some());
        assert!(json.get("modelName").is_none());
    }

    #[test]
    fn test_apply_preserves_identity() {
        let mut v = sample("Toyota", "Sedan", 2020);
        let id = v.id.clone();
        let created = v.created_at;
        let later = datetime!(2024-02-01 00:00:00 UTC);
        v.apply(
            VehiclePatch {
                brand: Some("Honda".into()),
                color: Some("Red".into()),
                ..Default::default()
            },
            later,
        );
        assert_eq!(v.id, id);
        assert_eq!(v.created_at, created);
        assert_eq!(v.updated_at, later);
        assert_eq!(v.brand, "Honda");
        assert_eq!(v.vehicle_type, "Sedan");
        assert_eq!(v.color.as_deref(), Some("Red"));
    }

    #[test]
    fn test_patch_ignores_identity_fields() {
        let patch: VehiclePatch = serde_json::from_value(serde_json::json!({
            "id": "forged",
            "createdAt": "2000-01-01T00:00:00Z",
            "year": 2021
        }))
        .unwrap();
        assert_eq!(patch.year, Some(2021));
        assert!(patch.brand.is_none());
    }

    #[test]
    fn test_validate_rejects_out_of_range_year() {
        let err = NewVehicle::new("Ford", "Pickup", 1899).validate().unwrap_err();
        assert!(err.to_string().starts_with("year"));

        let future = current_year() + 2;
        assert!(NewVehicle::new("Ford", "Pickup", future).validate().is_err());
        assert!(
            NewVehicle::new("Ford", "Pickup", current_year() + 1)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_validate_rejects_blank_and_negative() {
        assert!(NewVehicle::new("  ", "SUV", 2020).validate().is_err());
        assert!(
            NewVehicle::new("Fiat", "SUV", 2020)
                .with_price(-1.0)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_missing_required_field() {
        let patch = VehiclePatch {
            brand: Some("Fiat".into()),
            year: Some(2020),
            ..Default::default()
        };
        let err = NewVehicle::try_from(patch.validate().unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "type is required");
    }

    #[test]
    fn test_validate_trims() {
        let v = NewVehicle::new("  Fiat ", " Hatch", 2019)
            .with_color(" blue ")
            .validate()
            .unwrap();
        assert_eq!(v.brand, "Fiat");
        assert_eq!(v.vehicle_type, "Hatch");
        assert_eq!(v.color.as_deref(), Some("blue"));
    }

    #[test]
    fn test_filter_normalization() {
        let filter = VehicleFilter {
            brand: Some("  ToYoTa ".into()),
            vehicle_type: Some("   ".into()),
            year: Some(2020),
        }
        .normalized();
        assert_eq!(filter.brand.as_deref(), Some("toyota"));
        assert!(filter.vehicle_type.is_none());
        assert_eq!(filter.year, Some(2020));
    }

    #[test]
    fn test_filter_matching() {
        let v = sample("Toyota", "Sedan", 2020);
        assert!(VehicleFilter::default().matches(&v));
        assert!(VehicleFilter::default().with_brand("TOYOTA").matches(&v));
        assert!(!VehicleFilter::default().with_brand("Toy").matches(&v));
        assert!(!VehicleFilter::default().with_type("sedan").matches(&v));
        assert!(VehicleFilter::default().with_type("Sedan").matches(&v));
        assert!(!VehicleFilter::default().with_year(2021).matches(&v));
    }

    #[test]
    fn test_listing_order_newest_first_then_id() {
        let mut a = sample("A", "Sedan", 2020);
        let mut b = sample("B", "Sedan", 2020);
        a.id = "a".into();
        b.id = "b".into();
        let mut list = vec![a.clone(), b.clone()];
        list.sort_by(listing_order);
        assert_eq!(list[0].id, "b");

        a.created_at = datetime!(2024-03-01 00:00:00 UTC);
        let mut list = vec![b, a];
        list.sort_by(listing_order);
        assert_eq!(list[0].id, "a");
    }
}
