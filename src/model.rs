// Resource shapes exchanged with the Admin API. Unknown fields are kept
// in `extra` so `--json` output shows everything the API returned.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a published theme. Only one theme per shop has role `main`.
pub const ROLE_MAIN: &str = "main";
pub const ROLE_UNPUBLISHED: &str = "unpublished";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Theme {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Theme {
    pub fn is_live(&self) -> bool {
        self.role == ROLE_MAIN
    }
}

/// Fields accepted when updating a theme. Only set fields are sent.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ThemeUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Payload used to create a theme, optionally from a public zip URL.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NewTheme {
    pub name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
}

/// A theme file. Text files carry `value`, binary files carry a base64
/// `attachment`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Asset {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl Asset {
    /// The asset reduced to what the API needs to store it elsewhere.
    pub fn content_only(&self) -> Asset {
        Asset {
            key: self.key.clone(),
            value: self.value.clone(),
            attachment: self.attachment.clone(),
            ..Asset::default()
        }
    }
}
