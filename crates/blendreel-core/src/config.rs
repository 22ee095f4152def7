#![forbid(unsafe_code)]

//! Top-level marquee configuration.
//!
//! Every field has a default, so `{}` is a complete configuration. Unknown
//! fields are rejected to catch typos in host-supplied options.

use serde::{Deserialize, Serialize};

use crate::ambient::AmbientConfig;
use crate::cursor::CursorConfig;
use crate::error::Result;
use crate::layout::LayoutConfig;
use crate::loader::LoaderConfig;
use crate::motion::MotionConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarqueeConfig {
    pub loader: LoaderConfig,
    pub layout: LayoutConfig,
    pub motion: MotionConfig,
    pub ambient: AmbientConfig,
    pub cursor: CursorConfig,
}

impl MarqueeConfig {
    /// Parse and validate a JSON options object. Empty input means defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let config: Self = if s.trim().is_empty() {
            Self::default()
        } else {
            serde_json::from_str(s)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.loader.validate()?;
        self.layout.validate()?;
        self.motion.validate()?;
        self.ambient.validate()?;
        self.cursor.validate()
    }
}
