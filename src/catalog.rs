//! The diagnostic trouble-code catalog.
//!
//! A fixed, closed table mapping numeric codes to symbolic names. Fault state
//! is keyed by [`ErrorCode`] everywhere inside the simulator; symbolic names
//! are only produced at the mailbox boundary and only parsed back when the
//! tester injects errors by name.

use core::fmt;

/// A diagnostic trouble code from the fixed catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorCode(pub u32);

// Engine errors
pub const RPM_SENSOR_MALFUNCTION: ErrorCode = ErrorCode(0xE0110);
pub const FUEL_CONSM_UNAVAILABLE: ErrorCode = ErrorCode(0xE0111);
pub const SPEEDOMETER_FAULT: ErrorCode = ErrorCode(0xE0112);
pub const COOLANT_OVERHEAT: ErrorCode = ErrorCode(0xE0120);
pub const OIL_LEVEL_LOW: ErrorCode = ErrorCode(0xE0121);
pub const COOLANT_LEVEL_LOW: ErrorCode = ErrorCode(0xE0122);
pub const IGNITION_MALFUNCTION: ErrorCode = ErrorCode(0xE0130);
pub const INJECTOR_1_MALFUNCTION: ErrorCode = ErrorCode(0xE0131);
pub const INJECTOR_2_MALFUNCTION: ErrorCode = ErrorCode(0xE0132);
pub const INJECTOR_3_MALFUNCTION: ErrorCode = ErrorCode(0xE0133);
pub const INJECTOR_4_MALFUNCTION: ErrorCode = ErrorCode(0xE0134);
// Communication errors
pub const CAN_LOSS_OF_COMM: ErrorCode = ErrorCode(0xE0210);
pub const CAN_OVERVOLTAGE: ErrorCode = ErrorCode(0xE0211);
pub const CAN_UNDERVOLTAGE: ErrorCode = ErrorCode(0xE0212);
// Electrical errors
pub const ELECTRICAL_OVERVOLTAGE: ErrorCode = ErrorCode(0xE0310);
pub const ELECTRICAL_UNDERVOLTAGE: ErrorCode = ErrorCode(0xE0311);

pub const INJECTOR_CODES: [ErrorCode; 4] = [
    INJECTOR_1_MALFUNCTION,
    INJECTOR_2_MALFUNCTION,
    INJECTOR_3_MALFUNCTION,
    INJECTOR_4_MALFUNCTION,
];

const CATALOG: &[(ErrorCode, &str)] = &[
    (RPM_SENSOR_MALFUNCTION, "EngErr_RpmSensorMalfunction"),
    (FUEL_CONSM_UNAVAILABLE, "EngErr_FuelConsmUnav"),
    (SPEEDOMETER_FAULT, "EngErr_SpdmtrFault"),
    (COOLANT_OVERHEAT, "EngErr_EngCoolOverheat"),
    (OIL_LEVEL_LOW, "EngErr_OilLvlLow"),
    (COOLANT_LEVEL_LOW, "EngErr_CoolLvlLow"),
    (IGNITION_MALFUNCTION, "EngErr_IgnMalfunction"),
    (INJECTOR_1_MALFUNCTION, "EngErr_Malfunction_Injector_1"),
    (INJECTOR_2_MALFUNCTION, "EngErr_Malfunction_Injector_2"),
    (INJECTOR_3_MALFUNCTION, "EngErr_Malfunction_Injector_3"),
    (INJECTOR_4_MALFUNCTION, "EngErr_Malfunction_Injector_4"),
    (CAN_LOSS_OF_COMM, "ComErr_CanErr_LossOfComm"),
    (CAN_OVERVOLTAGE, "ComErr_CanErr_Overvoltage"),
    (CAN_UNDERVOLTAGE, "ComErr_CanErr_Undervoltage"),
    (ELECTRICAL_OVERVOLTAGE, "ElErr_Overvoltage"),
    (ELECTRICAL_UNDERVOLTAGE, "ElErr_Undervoltage"),
];

/// Symbolic name for a catalog code, `None` for codes outside the catalog.
pub fn name_of(code: ErrorCode) -> Option<&'static str> {
    CATALOG
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, name)| *name)
}

/// Resolve a symbolic name back to its code, `None` for unknown names.
pub fn code_of(name: &str) -> Option<ErrorCode> {
    CATALOG
        .iter()
        .find(|(_, n)| *n == name)
        .map(|(code, _)| *code)
}

pub fn contains(code: ErrorCode) -> bool {
    CATALOG.iter().any(|(c, _)| *c == code)
}

pub fn len() -> usize {
    CATALOG.len()
}

pub fn is_empty() -> bool {
    CATALOG.is_empty()
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match name_of(*self) {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "0x{:X}", self.0),
        }
    }
}
