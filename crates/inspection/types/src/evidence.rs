//! Evidence photos attached to inspections

use crate::error::TypeError;
use crate::ids::{InspectionId, PhotoId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raster formats accepted for photos and signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
}

impl MediaType {
    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
        }
    }

    /// Guess from a file name when the client sent no content type
    pub fn from_file_name(name: &str) -> Option<Self> {
        let ext = name.rsplit_once('.')?.1.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(MediaType::Jpeg),
            "png" => Some(MediaType::Png),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

impl FromStr for MediaType {
    type Err = TypeError;

    /// `image/jpg` is accepted and normalized to `image/jpeg`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let essence = s.split(';').next().unwrap_or(s).trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Ok(MediaType::Jpeg),
            "image/png" => Ok(MediaType::Png),
            _ => Err(TypeError::UnsupportedMediaType(s.to_string())),
        }
    }
}

/// Lowercase hex SHA-256 digest of a blob
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(String);

impl ContentHash {
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One captured image tied to an inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub inspection_id: InspectionId,
    pub path: String,
    pub media_type: MediaType,
    pub hash: ContentHash,
    /// 1-based position in capture order
    pub sequence: u32,
    pub taken_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jpg_normalizes_to_jpeg() {
        assert_eq!("image/jpg".parse::<MediaType>().unwrap(), MediaType::Jpeg);
        assert_eq!("IMAGE/JPEG".parse::<MediaType>().unwrap(), MediaType::Jpeg);
        assert_eq!(MediaType::Jpeg.mime(), "image/jpeg");
    }

    #[test]
    fn test_rejects_other_types() {
        assert!("image/gif".parse::<MediaType>().is_err());
        assert!("application/pdf".parse::<MediaType>().is_err());
        assert!("".parse::<MediaType>().is_err());
    }

    #[test]
    fn test_parameters_ignored() {
        assert_eq!(
            "image/png; charset=binary".parse::<MediaType>().unwrap(),
            MediaType::Png
        );
    }

    #[test]
    fn test_from_file_name() {
        assert_eq!(MediaType::from_file_name("a.JPG"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_file_name("sig.png"), Some(MediaType::Png));
        assert_eq!(MediaType::from_file_name("noext"), None);
    }

    #[test]
    fn test_serialized_as_mime() {
        let json = serde_json::to_string(&MediaType::Png).unwrap();
        assert_eq!(json, "\"image/png\"");
    }
}
