//! Vehicle signal models: engine management and power supply.

pub mod engine;
pub mod supply;

pub use engine::{Engine, EngineReadout};
pub use supply::PowerSupply;

/// Selected gear. Anything the tester sends outside the known set parses to
/// `Unknown`, which behaves like neutral instead of failing the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gear {
    Neutral,
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Reverse,
    Unknown,
}

impl Gear {
    pub fn parse(s: &str) -> Self {
        match s {
            "N" => Gear::Neutral,
            "1" => Gear::First,
            "2" => Gear::Second,
            "3" => Gear::Third,
            "4" => Gear::Fourth,
            "5" => Gear::Fifth,
            "6" => Gear::Sixth,
            "R" => Gear::Reverse,
            _ => Gear::Unknown,
        }
    }

    /// Transmission ratio used by the rpm model.
    pub fn ratio(self) -> f64 {
        match self {
            Gear::Neutral | Gear::Unknown => 1.0,
            Gear::First => 3.1,
            Gear::Second => 1.912,
            Gear::Third => 1.288,
            Gear::Fourth => 0.949,
            Gear::Fifth => 0.998,
            Gear::Sixth => 0.958,
            Gear::Reverse => 3.287,
        }
    }

    /// Neutral and unrecognized gears produce no road speed.
    pub fn drives_wheels(self) -> bool {
        !matches!(self, Gear::Neutral | Gear::Unknown)
    }
}

/// Symbolic label for an ignition state code.
pub fn ign_label(ign: u8) -> &'static str {
    match ign {
        0 => "0_OFF",
        1 => "1_IGN",
        2 => "2_ACC",
        _ => "3_ERR",
    }
}

/// Tester-controlled inputs consumed by the engine model each cycle.
#[derive(Debug, Clone, Copy)]
pub struct DriverInputs {
    pub gear: Gear,
    pub pedal: u32,
    pub ign_stat: u8,
    pub coolant_offset: i64,
    pub oil_offset: i64,
}
