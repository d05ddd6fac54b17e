//! Cache key derivation
//!
//! An entry key has the shape `{namespace}:entry:{brief_hash}:{variant_digest}`.
//! The brief hash stays a literal segment so invalidation can prefix-scan
//! every format/dimension variant cached for one brief; the variant digest
//! folds format and dimensions into a fixed-width segment so the key never
//! needs escaping.

use crate::brief::BriefHash;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::str::FromStr;

/// Output container format of a rendered variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// H.264/H.265 video in an MP4 container
    Mp4,
    /// VP9/AV1 video in a WebM container
    Webm,
    /// Animated GIF
    Gif,
    /// Static PNG image
    Png,
    /// Static JPEG image
    Jpeg,
}

impl OutputFormat {
    /// Lowercase name used in keys and serialized entries
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mp4" => Ok(Self::Mp4),
            "webm" => Ok(Self::Webm),
            "gif" => Ok(Self::Gif),
            "png" => Ok(Self::Png),
            "jpeg" => Ok(Self::Jpeg),
            other => Err(Error::configuration(format!(
                "Unknown output format: {other}"
            ))),
        }
    }
}

/// Format and dimensions of one rendered variant of a brief
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RenderVariant {
    /// Output container format
    pub format: OutputFormat,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl RenderVariant {
    /// Create a variant, validating that both dimensions are positive
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] when either dimension is zero.
    pub fn new(format: OutputFormat, width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::configuration(format!(
                "Render dimensions must be positive, got {width}x{height}"
            )));
        }
        Ok(Self {
            format,
            width,
            height,
        })
    }

    /// Fixed-width digest of the variant (SHA-256 of `format|WxH`, lowercase
    /// hex)
    #[must_use]
    pub fn digest(&self) -> String {
        let encoded = format!("{}|{}x{}", self.format, self.width, self.height);
        hex::encode(Sha256::digest(encoded.as_bytes()))
    }
}

impl std::fmt::Display for RenderVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}x{}", self.format, self.width, self.height)
    }
}

/// Store key for one (brief, variant) combination
#[must_use]
pub fn entry_key(namespace: &str, brief_hash: &BriefHash, variant: &RenderVariant) -> String {
    format!(
        "{}:{}",
        brief_prefix(namespace, brief_hash),
        variant.digest()
    )
}

/// Prefix shared by every variant cached for one brief
#[must_use]
pub fn brief_prefix(namespace: &str, brief_hash: &BriefHash) -> String {
    format!("{}{}", entry_prefix(namespace), brief_hash.as_hex())
}

/// Prefix shared by every cache entry in a namespace
#[must_use]
pub fn entry_prefix(namespace: &str) -> String {
    format!("{namespace}:entry:")
}

/// Store key for a statistics counter
#[must_use]
pub fn stats_key(namespace: &str, counter: &str) -> String {
    format!("{namespace}:stats:{counter}")
}
