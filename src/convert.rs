use ferrous_opencc::{config::BuiltinConfig, OpenCC};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::error::{CaptionError, Result};

/// Character-level script conversion with a direction fixed at construction.
pub trait ScriptConverter: Send + Sync {
    /// Convert text; never fails for valid Unicode input
    fn convert(&self, text: &str) -> String;

    fn direction(&self) -> ConversionDirection;
}

/// Supported Han-script conversion directions (OpenCC built-in configs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversionDirection {
    /// Simplified -> Traditional
    S2t,
    /// Traditional -> Simplified
    T2s,
    /// Simplified -> Traditional (Taiwan standard)
    S2tw,
    /// Traditional (Taiwan standard) -> Simplified
    Tw2s,
    /// Simplified -> Traditional (Taiwan standard, with Taiwanese phrases)
    S2twp,
    /// Traditional (Taiwan standard, with phrases) -> Simplified
    Tw2sp,
    /// Simplified -> Traditional (Hong Kong variant)
    S2hk,
    /// Traditional (Hong Kong variant) -> Simplified
    Hk2s,
}

impl ConversionDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::S2t => "s2t",
            Self::T2s => "t2s",
            Self::S2tw => "s2tw",
            Self::Tw2s => "tw2s",
            Self::S2twp => "s2twp",
            Self::Tw2sp => "tw2sp",
            Self::S2hk => "s2hk",
            Self::Hk2s => "hk2s",
        }
    }

    fn builtin_config(&self) -> BuiltinConfig {
        match self {
            Self::S2t => BuiltinConfig::S2t,
            Self::T2s => BuiltinConfig::T2s,
            Self::S2tw => BuiltinConfig::S2tw,
            Self::Tw2s => BuiltinConfig::Tw2s,
            Self::S2twp => BuiltinConfig::S2twp,
            Self::Tw2sp => BuiltinConfig::Tw2sp,
            Self::S2hk => BuiltinConfig::S2hk,
            Self::Hk2s => BuiltinConfig::Hk2s,
        }
    }
}

impl Default for ConversionDirection {
    fn default() -> Self {
        Self::S2t
    }
}

impl FromStr for ConversionDirection {
    type Err = CaptionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s2t" => Ok(Self::S2t),
            "t2s" => Ok(Self::T2s),
            "s2tw" => Ok(Self::S2tw),
            "tw2s" => Ok(Self::Tw2s),
            "s2twp" => Ok(Self::S2twp),
            "tw2sp" => Ok(Self::Tw2sp),
            "s2hk" => Ok(Self::S2hk),
            "hk2s" => Ok(Self::Hk2s),
            _ => Err(CaptionError::Config(format!(
                "Invalid conversion direction '{}'. Valid directions: s2t, t2s, s2tw, tw2s, s2twp, tw2sp, s2hk, hk2s",
                s
            ))),
        }
    }
}

impl std::fmt::Display for ConversionDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// OpenCC-backed converter
pub struct OpenCcConverter {
    inner: OpenCC,
    direction: ConversionDirection,
}

impl OpenCcConverter {
    pub fn new(direction: ConversionDirection) -> Result<Self> {
        let inner = OpenCC::from_config(direction.builtin_config()).map_err(|e| {
            CaptionError::Conversion(format!("Failed to initialize OpenCC ({}): {}", direction, e))
        })?;
        debug!("OpenCC converter ready ({})", direction);
        Ok(Self { inner, direction })
    }
}

impl ScriptConverter for OpenCcConverter {
    fn convert(&self, text: &str) -> String {
        self.inner.convert(text)
    }

    fn direction(&self) -> ConversionDirection {
        self.direction
    }
}
