//! Mailbox wire records.
//!
//! One input record is read and one [`Snapshot`] is written per cycle. Every
//! input field carries the documented default so a partial (or absent) record
//! still produces a well-formed cycle. Snapshot field names and shapes are
//! frozen; the external diagnostic tester consumes them verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Value published in place of every numeric field while access is not
/// authorized.
pub const SENTINEL_NUMERIC: i64 = 401;
/// Sentinel for string fields.
pub const SENTINEL_TEXT: &str = "401";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecurityRequest {
    pub auth_request: bool,
    pub key: u64,
}

impl Default for SecurityRequest {
    fn default() -> Self {
        Self {
            auth_request: true,
            key: 0,
        }
    }
}

/// The tester-written input record.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputFrame {
    pub gear: String,
    pub pedal_lvl: u32,
    pub ign_stat: u8,
    pub error_injection: Vec<String>,
    pub manipulate_oil_levels: i64,
    pub manipulate_coolant_levels: i64,
    pub manipulate_voltage: f64,
    pub clear_error_memory: bool,
    pub clear_error_log: bool,
    pub parameter_to_delete: String,
    pub can_handle_error_manager: bool,
    pub security_access: SecurityRequest,
}

impl Default for InputFrame {
    fn default() -> Self {
        Self {
            gear: "N".to_string(),
            pedal_lvl: 0,
            ign_stat: 1,
            error_injection: Vec::new(),
            manipulate_oil_levels: 0,
            manipulate_coolant_levels: 0,
            manipulate_voltage: 0.0,
            clear_error_memory: false,
            clear_error_log: false,
            parameter_to_delete: String::new(),
            can_handle_error_manager: false,
            security_access: SecurityRequest::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineInfo {
    pub rpm: i64,
    pub speed: i64,
    pub gear: String,
    pub power: i64,
    pub torque: i64,
    pub fuel_consumption: f64,
    pub coolant_temp: i64,
    pub coolant_level: i64,
    pub oil_level: i64,
    pub pedal_lvl: i64,
}

impl EngineInfo {
    /// The access-denied placeholder block.
    pub fn sentinel() -> Self {
        Self {
            rpm: SENTINEL_NUMERIC,
            speed: SENTINEL_NUMERIC,
            gear: SENTINEL_TEXT.to_string(),
            power: SENTINEL_NUMERIC,
            torque: SENTINEL_NUMERIC,
            fuel_consumption: SENTINEL_NUMERIC as f64,
            coolant_temp: SENTINEL_NUMERIC,
            coolant_level: SENTINEL_NUMERIC,
            oil_level: SENTINEL_NUMERIC,
            pedal_lvl: SENTINEL_NUMERIC,
        }
    }
}

/// Security section, published truthfully in every snapshot so a locked
/// tester can still run the handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityStatus {
    pub auth_response: (u8, String),
    pub auth_request: bool,
    pub seed: Option<u64>,
    pub key: u64,
}

/// The single live output record, replaced wholesale every cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub ign_stat: String,
    pub power_supply: f64,
    pub engine_info: EngineInfo,
    pub error_log: BTreeMap<String, u32>,
    pub error_input: Vec<String>,
    pub error_memory: BTreeMap<String, String>,
    pub can_handle_error_manager: bool,
    pub clear_error_memory: bool,
    pub clear_error_log: bool,
    pub security_access: SecurityStatus,
    pub time_stamp: String,
    #[serde(rename = "REAL_RPM")]
    pub real_rpm: i64,
}
