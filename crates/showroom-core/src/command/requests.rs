// ── Typed request structs for Command payloads ──
//
// Form input crosses into the core as one of these structs; `validate()`
// runs before anything is sent, so required-field failures never leave
// the process.

use crate::error::CoreError;
use crate::model::{Colour, DocumentId, Rating, Role};

fn required(field: &str, value: &str) -> Result<(), CoreError> {
    if value.trim().is_empty() {
        Err(CoreError::ValidationFailed {
            message: format!("{field} is required"),
        })
    } else {
        Ok(())
    }
}

// ── Car ────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SaveCarRequest {
    pub name: String,
    pub manufacturer: String,
    pub year: u16,
    pub colour: String,
    /// Blob path of an already-uploaded model file, if any.
    pub model_file: Option<String>,
    pub approved: bool,
}

impl SaveCarRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        required("name", &self.name)?;
        required("manufacturer", &self.manufacturer)?;
        if self.year < 1886 {
            return Err(CoreError::ValidationFailed {
                message: format!("year {} predates the automobile", self.year),
            });
        }
        Colour::parse(&self.colour).map_err(|message| CoreError::ValidationFailed { message })?;
        Ok(())
    }

    pub(crate) fn colour(&self) -> Colour {
        // validate() runs first; fall back to black for defense in depth.
        Colour::parse(&self.colour).unwrap_or_else(|_| Colour::parse("#000000").expect("literal"))
    }
}

// ── Review ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SubmitReviewRequest {
    pub car_id: DocumentId,
    pub rating: u8,
    pub comment: String,
}

impl SubmitReviewRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        required("comment", &self.comment)?;
        Rating::new(self.rating).map_err(|message| CoreError::ValidationFailed { message })?;
        Ok(())
    }
}

// ── Profile ────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SaveProfileRequest {
    pub display_name: String,
    pub email: String,
    pub role: Role,
}

impl SaveProfileRequest {
    pub fn validate(&self) -> Result<(), CoreError> {
        required("displayName", &self.display_name)?;
        required("email", &self.email)?;
        Ok(())
    }
}

// ── Model upload ───────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct UploadModelRequest {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadModelRequest {
    /// Only `.glb` / `.gltf` scene files are accepted.
    pub fn validate(&self) -> Result<(), CoreError> {
        required("fileName", &self.file_name)?;
        let lower = self.file_name.to_lowercase();
        if !lower.ends_with(".glb") && !lower.ends_with(".gltf") {
            return Err(CoreError::ValidationFailed {
                message: "only .glb or .gltf files allowed".into(),
            });
        }
        if self.bytes.is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "file is empty".into(),
            });
        }
        Ok(())
    }

    pub(crate) fn content_type(&self) -> &'static str {
        if self.file_name.to_lowercase().ends_with(".gltf") {
            "model/gltf+json"
        } else {
            "model/gltf-binary"
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn car_request_requires_fields() {
        let mut req = SaveCarRequest {
            name: "GT3".into(),
            manufacturer: "Porsche".into(),
            year: 2023,
            colour: "#101010".into(),
            model_file: None,
            approved: false,
        };
        req.validate().unwrap();

        req.name = "  ".into();
        assert!(req.validate().is_err());
    }

    #[test]
    fn review_request_checks_rating_range() {
        let mut req = SubmitReviewRequest {
            car_id: DocumentId::from("c1"),
            rating: 5,
            comment: "nice".into(),
        };
        req.validate().unwrap();

        req.rating = 0;
        assert!(req.validate().is_err());
        req.rating = 3;
        req.comment = String::new();
        assert!(req.validate().is_err());
    }

    #[test]
    fn upload_request_checks_extension() {
        let req = UploadModelRequest {
            file_name: "huracan.glb".into(),
            bytes: vec![1, 2, 3],
        };
        req.validate().unwrap();
        assert_eq!(req.content_type(), "model/gltf-binary");

        let bad = UploadModelRequest {
            file_name: "huracan.obj".into(),
            bytes: vec![1],
        };
        assert!(bad.validate().is_err());
    }
}
