//! Power-supply simulation.
//!
//! Supply voltage tracks the ignition state with a small jitter band, shifted
//! by the tester's voltage manipulation input. Crossing the electrical or CAN
//! thresholds raises the corresponding fault codes.

use rand::Rng;

use crate::catalog::{
    CAN_OVERVOLTAGE, CAN_UNDERVOLTAGE, ELECTRICAL_OVERVOLTAGE, ELECTRICAL_UNDERVOLTAGE,
};
use crate::fault::{self, ErrorInput, FaultMemory};

const UNDERVOLTAGE_THRESHOLD: f64 = 7.5;
const OVERVOLTAGE_THRESHOLD: f64 = 17.4;
const CAN_OVERVOLTAGE_THRESHOLD: f64 = 19.0;
const CAN_UNDERVOLTAGE_THRESHOLD: f64 = 5.0;

/// Battery/alternator model. Keeps the last computed voltage so injected
/// electrical codes can freeze the reading.
#[derive(Debug)]
pub struct PowerSupply {
    voltage: f64,
}

impl Default for PowerSupply {
    fn default() -> Self {
        Self { voltage: 12.0 }
    }
}

impl PowerSupply {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voltage(&self) -> f64 {
        self.voltage
    }

    /// One supply cycle. `ign` is the ignition state read back by the engine
    /// on the previous cycle. While an electrical voltage code is being
    /// injected the reading is left untouched, as is an unknown ignition
    /// state.
    pub fn update(
        &mut self,
        ign: u8,
        offset: f64,
        faults: &mut FaultMemory,
        input: &mut ErrorInput,
        locked: bool,
        rng: &mut impl Rng,
    ) -> f64 {
        let injected = input.contains(&ELECTRICAL_OVERVOLTAGE)
            || input.contains(&ELECTRICAL_UNDERVOLTAGE);
        if !injected {
            let base: Option<f64> = match ign {
                0 => Some(rng.gen_range(11.9..=12.1)),
                1 => Some(rng.gen_range(12.9..=13.1)),
                2 => Some(rng.gen_range(13.9..=14.1)),
                _ => None,
            };
            if let Some(base) = base {
                self.voltage = (base * 100.0).round() / 100.0 + offset;
            }
        }

        if self.voltage < UNDERVOLTAGE_THRESHOLD {
            fault::push_code(input, ELECTRICAL_UNDERVOLTAGE);
            faults.raise(ELECTRICAL_UNDERVOLTAGE, input, locked);
        }
        if self.voltage > OVERVOLTAGE_THRESHOLD {
            fault::push_code(input, ELECTRICAL_OVERVOLTAGE);
            faults.raise(ELECTRICAL_OVERVOLTAGE, input, locked);
        }
        if self.voltage > CAN_OVERVOLTAGE_THRESHOLD {
            fault::push_code(input, CAN_OVERVOLTAGE);
            faults.raise(CAN_OVERVOLTAGE, input, locked);
        }
        if self.voltage < CAN_UNDERVOLTAGE_THRESHOLD {
            fault::push_code(input, CAN_UNDERVOLTAGE);
            faults.raise(CAN_UNDERVOLTAGE, input, locked);
        }

        self.voltage
    }
}
