use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::config::WheelSettings;
use crate::document::HistoryEntry;

/// Protocol version - increment when making breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

// === Server -> Client ===

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ServerMsg {
    #[serde(rename = "welcome")]
    Welcome(WelcomeMsg),
    #[serde(rename = "wheel_state")]
    WheelState(WheelSnapshot),
    #[serde(rename = "spin_started")]
    SpinStarted(SpinStartedMsg),
    #[serde(rename = "frame")]
    Frame(FrameMsg),
    #[serde(rename = "spin_result")]
    SpinResult(SpinResultMsg),
    #[serde(rename = "export")]
    Export(ExportMsg),
    #[serde(rename = "notice")]
    Notice(NoticeMsg),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WelcomeMsg {
    pub protocol_version: u32,
    pub server_version: String,
    pub state: WheelSnapshot,
}

/// Everything a client needs to draw the wheel and its side panels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct WheelSnapshot {
    pub items: Vec<String>,
    pub history: Vec<HistoryEntry>,
    pub settings: WheelSettings,
    pub rotation: f64,
    pub spinning: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "snake_case")]
pub enum EasingWire {
    CubicOut,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SpinStartedMsg {
    pub start_angle: f64,
    pub total_delta: f64,
    pub duration_ms: u32,
    pub easing: EasingWire,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct FrameMsg {
    pub rotation: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "camelCase")]
pub struct SpinResultMsg {
    pub winner_index: u32,
    pub winner: String,
    pub rotation: f64,
    pub history: Vec<HistoryEntry>,
    pub sound_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct ExportMsg {
    /// Pretty-printed JSON, ready to be saved as `wheel-config.json`
    pub document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
pub struct NoticeMsg {
    pub message: String,
}

// === Client -> Server ===

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Yesno,
    Numbers,
    Colors,
    Food,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../client/src/shared/generated/")]
#[serde(tag = "type")]
pub enum ClientMsg {
    #[serde(rename = "spin")]
    Spin,
    #[serde(rename = "add_item")]
    AddItem { text: String },
    #[serde(rename = "remove_item")]
    RemoveItem { index: u32 },
    #[serde(rename = "edit_item")]
    EditItem { index: u32, text: String },
    #[serde(rename = "clear_items")]
    ClearItems,
    #[serde(rename = "load_preset")]
    LoadPreset { preset: PresetName },
    #[serde(rename = "set_wheel_size")]
    SetWheelSize { size: u32 },
    #[serde(rename = "set_spin_duration")]
    SetSpinDuration { ms: u32 },
    #[serde(rename = "set_sound_enabled")]
    SetSoundEnabled { enabled: bool },
    #[serde(rename = "toggle_dark_mode")]
    ToggleDarkMode,
    #[serde(rename = "import")]
    Import { document: String },
    #[serde(rename = "export")]
    Export,
    /// Put the wheel back at a previously saved resting rotation (radians)
    #[serde(rename = "restore_rotation")]
    RestoreRotation { rotation: f64 },
}
