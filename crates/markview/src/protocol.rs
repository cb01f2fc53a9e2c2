//! Wire protocol between the controller and the display surface.
//!
//! Every message is a JSON object tagged by a `type` field:
//!
//! - controller → surface: `{"type":"update","html":…,"text":…,"isEditMode":…}`
//! - surface → controller: `{"type":"toggleMode"}` or `{"type":"edit","text":…}`
//!
//! An unrecognised `type` decodes to an `Unknown` variant which receivers ignore.
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ViewMode {
    #[default]
    Preview,
    Edit,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Preview => ViewMode::Edit,
            ViewMode::Edit => ViewMode::Preview,
        }
    }

    pub fn is_edit(self) -> bool {
        self == ViewMode::Edit
    }

    pub fn from_edit_flag(is_edit: bool) -> Self {
        if is_edit {
            ViewMode::Edit
        } else {
            ViewMode::Preview
        }
    }
}

/// One full `{html, text, mode}` payload. It replaces whatever the surface mirrored before.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub html: String,
    pub text: String,
    #[serde(rename = "isEditMode", with = "edit_flag")]
    pub mode: ViewMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ControllerMessage {
    Update(RenderSnapshot),
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SurfaceMessage {
    ToggleMode,
    Edit {
        text: String,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub fn encode<M: Serialize>(message: &M) -> Result<String, ProtocolError> {
    Ok(serde_json::to_string(message)?)
}

pub fn decode<M: DeserializeOwned>(payload: &str) -> Result<M, ProtocolError> {
    Ok(serde_json::from_str(payload)?)
}

mod edit_flag {
    use serde::Deserialize;
    use serde::Deserializer;
    use serde::Serializer;

    use super::ViewMode;

    pub fn serialize<S: Serializer>(mode: &ViewMode, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(mode.is_edit())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ViewMode, D::Error> {
        bool::deserialize(deserializer).map(ViewMode::from_edit_flag)
    }
}
