// ── Car catalogue entry ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use showroom_api::RawDocument;

use crate::error::CoreError;
use crate::model::collections;
use crate::model::DocumentId;

/// A display colour, kept in `#rrggbb` hex form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Colour(String);

impl Colour {
    /// Parse and normalize a `#rrggbb` hex colour (lowercased).
    pub fn parse(raw: &str) -> Result<Self, String> {
        let s = raw.trim().to_lowercase();
        let hex = s.strip_prefix('#').ok_or_else(|| format!("colour {raw:?} missing '#'"))?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(format!("colour {raw:?} is not #rrggbb"));
        }
        Ok(Self(format!("#{hex}")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode into `(r, g, b)` components.
    pub fn rgb(&self) -> (u8, u8, u8) {
        let hex = &self.0[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        (channel(0), channel(2), channel(4))
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A car in the catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Car {
    pub id: DocumentId,
    pub name: String,
    pub manufacturer: String,
    pub year: u16,
    pub colour: Colour,
    /// Blob-storage path of the 3D model file (`.glb` / `.gltf`), if any.
    pub model_file: Option<String>,
    /// Profile id of the submitting user, when known.
    pub owner_id: Option<DocumentId>,
    /// Moderation flag: only approved cars appear in the public catalogue.
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

/// Wire form of a car document.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CarDoc {
    name: String,
    manufacturer: String,
    year: u16,
    colour: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    model_file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    owner_id: Option<String>,
    #[serde(default)]
    approved: bool,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl Car {
    pub fn has_model(&self) -> bool {
        self.model_file.is_some()
    }

    /// Validate a raw store document into a typed car.
    pub fn from_document(doc: &RawDocument) -> Result<Self, CoreError> {
        let invalid = |reason: String| CoreError::InvalidDocument {
            collection: collections::CARS.into(),
            id: doc.id.clone(),
            reason,
        };

        let wire: CarDoc =
            serde_json::from_value(doc.data.clone()).map_err(|e| invalid(e.to_string()))?;

        if wire.name.trim().is_empty() {
            return Err(invalid("name is empty".into()));
        }
        if wire.manufacturer.trim().is_empty() {
            return Err(invalid("manufacturer is empty".into()));
        }
        let colour = Colour::parse(&wire.colour).map_err(invalid)?;

        Ok(Self {
            id: DocumentId::from(doc.id.clone()),
            name: wire.name,
            manufacturer: wire.manufacturer,
            year: wire.year,
            colour,
            model_file: wire.model_file,
            owner_id: wire.owner_id.map(DocumentId::from),
            approved: wire.approved,
            created_at: wire.created_at.unwrap_or(DateTime::UNIX_EPOCH),
        })
    }

    /// Render the canonical wire body for a full-document overwrite.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::to_value(CarDoc {
            name: self.name.clone(),
            manufacturer: self.manufacturer.clone(),
            year: self.year,
            colour: self.colour.as_str().to_owned(),
            model_file: self.model_file.clone(),
            owner_id: self.owner_id.as_ref().map(|id| id.as_str().to_owned()),
            approved: self.approved,
            created_at: Some(self.created_at),
        })
        .expect("car body serialization cannot fail")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn raw(id: &str, data: serde_json::Value) -> RawDocument {
        RawDocument {
            id: id.into(),
            data,
        }
    }

    #[test]
    fn colour_parses_and_normalizes() {
        let c = Colour::parse(" #FF0000 ").unwrap();
        assert_eq!(c.as_str(), "#ff0000");
        assert_eq!(c.rgb(), (255, 0, 0));
    }

    #[test]
    fn colour_rejects_garbage() {
        assert!(Colour::parse("red").is_err());
        assert!(Colour::parse("#ff00").is_err());
        assert!(Colour::parse("#gggggg").is_err());
    }

    #[test]
    fn car_from_document() {
        let doc = raw(
            "car-1",
            json!({
                "name": "911 GT3",
                "manufacturer": "Porsche",
                "year": 2023,
                "colour": "#0055ff",
                "modelFile": "models/gt3.glb",
                "approved": true,
                "createdAt": "2024-05-01T12:00:00Z"
            }),
        );

        let car = Car::from_document(&doc).unwrap();
        assert_eq!(car.id.as_str(), "car-1");
        assert_eq!(car.manufacturer, "Porsche");
        assert!(car.approved);
        assert!(car.has_model());
    }

    #[test]
    fn car_missing_name_is_invalid() {
        let doc = raw(
            "car-2",
            json!({ "name": "  ", "manufacturer": "Audi", "year": 2020, "colour": "#000000" }),
        );
        let err = Car::from_document(&doc).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDocument { .. }));
    }

    #[test]
    fn car_body_roundtrip() {
        let doc = raw(
            "car-3",
            json!({ "name": "Model 3", "manufacturer": "Tesla", "year": 2022, "colour": "#ffffff" }),
        );
        let car = Car::from_document(&doc).unwrap();

        let body = car.to_body();
        let reparsed = Car::from_document(&raw("car-3", body)).unwrap();
        assert_eq!(car, reparsed);
    }
}
