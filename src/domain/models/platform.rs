use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    LineOfficialAccount,
    FacebookPage,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LineOfficialAccount => "line",
            Platform::FacebookPage => "facebook",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "line" => Some(Platform::LineOfficialAccount),
            "facebook" => Some(Platform::FacebookPage),
            _ => None,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
