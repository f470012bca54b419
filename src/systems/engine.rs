//! Engine management: rpm, power, torque, speed, fluids, temperature, fuel.
//!
//! All signal computations are pure given the driver inputs, the fault state,
//! and a randomness source; they carry small jitter bands so consecutive
//! snapshots look like a live engine rather than a constant table.

use rand::Rng;

use super::{DriverInputs, Gear};
use crate::catalog::{
    self, COOLANT_LEVEL_LOW, COOLANT_OVERHEAT, FUEL_CONSM_UNAVAILABLE, IGNITION_MALFUNCTION,
    OIL_LEVEL_LOW, RPM_SENSOR_MALFUNCTION, SPEEDOMETER_FAULT,
};
use crate::fault::{self, ErrorInput, FaultMemory, FaultState};

const MAX_RPM: i64 = 5_000;
const IDLE_RPM: f64 = 800.0;
const PEDAL_RPM_GAIN: f64 = 42.0;
const RPM_TOLERANCE: f64 = 0.01;
const POWER_TOLERANCE: f64 = 0.02;

/// rpm/hp breakpoints from idle to redline.
const POWER_CURVE: [(f64, f64); 6] = [
    (800.0, 50.0),
    (2000.0, 80.0),
    (3000.0, 120.0),
    (4000.0, 150.0),
    (4500.0, 135.0),
    (5000.0, 125.0),
];

const TORQUE_FACTOR: f64 = 9549.0;
const IDLE_BAND_RPM: f64 = IDLE_RPM * 1.1;
const LOW_PEDAL_THRESHOLD: u32 = 26;
const CREEP_PEDAL_THRESHOLD: u32 = 12;

const INJECTOR_POWER_LOSS_HP: i64 = 25;
const INJECTOR_STALL_COUNT: usize = 2;

const RUNNING_RPM_THRESHOLD: i64 = 825;
const MIN_LEVEL_RUNNING: i64 = 95;
const MIN_LEVEL_IDLE: i64 = 70;

const WARM_RPM_THRESHOLD: i64 = 4_300;
const OVERHEAT_LOAD_RPM: i64 = 2_500;
const OVERHEAT_TEMP_C: i64 = 130;

const WHEEL_RADIUS_CM: f64 = 16.0 * 2.54;
const FINAL_DRIVE_RATIO: f64 = 3.9;

const FUEL_IDLE_RPM: f64 = 800.0;
const FUEL_MAX_RPM: f64 = 6_000.0;
const FUEL_IDLE_LPH: f64 = 0.8;
const FUEL_MAX_LPH: f64 = 15.0;

/// Signals published from the last engine update.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineReadout {
    pub rpm: i64,
    pub real_rpm: i64,
    pub power: i64,
    pub torque: i64,
    pub speed: i64,
    pub coolant_temp: i64,
    pub coolant_level: i64,
    pub oil_level: i64,
    pub fuel_consumption: f64,
    pub act_ign: u8,
}

/// The engine signal model. Holds only the last computed cycle plus the
/// pending injector ignition cutoff; everything else is recomputed each call.
#[derive(Debug, Default)]
pub struct Engine {
    readout: EngineReadout,
    ign_cutoff: bool,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn readout(&self) -> EngineReadout {
        self.readout
    }

    /// Ignition state as read back by the ECU, not the raw tester input.
    pub fn act_ign(&self) -> u8 {
        self.readout.act_ign
    }

    /// One engine cycle: derive the effective ignition state, compute every
    /// signal, and raise whatever faults the signals imply.
    pub fn update(
        &mut self,
        driver: &DriverInputs,
        faults: &mut FaultMemory,
        input: &mut ErrorInput,
        locked: bool,
        rng: &mut impl Rng,
    ) {
        let mut ign = driver.ign_stat.min(3);

        // A double injector fault in the previous cycle stalls the engine now.
        if self.ign_cutoff {
            ign = 0;
            self.ign_cutoff = false;
        }

        // Injector codes are evaluated on every cycle, stalled or not, so the
        // cutoff stays armed for as long as two or more keep arriving.
        let injector_count = injector_fault_count(faults, input, locked);
        if injector_count >= INJECTOR_STALL_COUNT {
            self.ign_cutoff = true;
        }

        // Electrical undervoltage cascades into an ignition malfunction.
        if faults.is_active(catalog::ELECTRICAL_UNDERVOLTAGE) {
            fault::push_unique(input, IGNITION_MALFUNCTION);
            faults.raise(IGNITION_MALFUNCTION, input, locked);
            if faults.is_active(IGNITION_MALFUNCTION) {
                ign = 0;
            }
        }
        self.readout.act_ign = ign;

        // Raw rpm ignores the rpm-sensor fault so the overheat model keeps
        // seeing the true engine load.
        self.readout.real_rpm = calc_rpm(driver.gear, driver.pedal, ign, false, rng);
        if driver.pedal > 0 && ign != 0 {
            // Engine under load reads back as ACC
            self.readout.act_ign = 2;
        }

        if ign == 0 || ign == 3 || input.contains(&RPM_SENSOR_MALFUNCTION) {
            faults.raise(RPM_SENSOR_MALFUNCTION, input, locked);
        }

        if faults.is_active(RPM_SENSOR_MALFUNCTION) || ign == 0 {
            if ign != 0 {
                fault::push_unique(input, FUEL_CONSM_UNAVAILABLE);
            }
            faults.raise(FUEL_CONSM_UNAVAILABLE, input, locked);
            self.readout.rpm = 0;
            self.readout.power = 0;
            self.readout.torque = 0;
        } else {
            self.readout.rpm = calc_rpm(driver.gear, driver.pedal, ign, false, rng);
            let loss = injector_count as i64 * INJECTOR_POWER_LOSS_HP;
            self.readout.power = calc_power(self.readout.rpm, loss, rng);
            self.readout.torque = calc_torque(self.readout.rpm, self.readout.power, driver.pedal, rng);
        }

        let (coolant, oil) = fluid_levels(self.readout.rpm, self.readout.act_ign, rng);
        self.readout.coolant_level = coolant + driver.coolant_offset;
        self.readout.oil_level = oil + driver.oil_offset;

        self.readout.fuel_consumption =
            calc_fuel_consumption(self.readout.rpm, self.readout.act_ign, faults);
        self.readout.coolant_temp = self.coolant_temp(faults, input, locked, rng);
        self.check_fluid_levels(faults, input, locked);

        self.readout.speed = if input.contains(&SPEEDOMETER_FAULT) {
            faults.raise(SPEEDOMETER_FAULT, input, locked);
            0
        } else {
            calc_speed(self.readout.rpm, driver.gear)
        };
    }

    /// Coolant temperature keyed to raw rpm band; spikes into overheat while a
    /// low-fluid fault is active and decays once it passivates.
    fn coolant_temp(
        &mut self,
        faults: &mut FaultMemory,
        input: &mut ErrorInput,
        locked: bool,
        rng: &mut impl Rng,
    ) -> i64 {
        let ign_on = self.readout.act_ign != 0;
        let real_rpm = self.readout.real_rpm;

        let mut temp = rng.gen_range(87..=92);
        if ign_on && real_rpm > WARM_RPM_THRESHOLD {
            temp = rng.gen_range(97..=102);
        }
        if ign_on && real_rpm > OVERHEAT_LOAD_RPM {
            let coolant_low = faults.state_of(COOLANT_LEVEL_LOW);
            let oil_low = faults.state_of(OIL_LEVEL_LOW);
            if coolant_low == Some(FaultState::Active) || oil_low == Some(FaultState::Active) {
                temp = rng.gen_range(132..=137);
                if temp > OVERHEAT_TEMP_C {
                    fault::push_unique(input, COOLANT_OVERHEAT);
                    faults.raise(COOLANT_OVERHEAT, input, locked);
                }
            } else if coolant_low == Some(FaultState::Passive)
                || oil_low == Some(FaultState::Passive)
            {
                input.retain(|c| *c != COOLANT_OVERHEAT);
                temp = if real_rpm > WARM_RPM_THRESHOLD {
                    rng.gen_range(97..=102)
                } else {
                    rng.gen_range(87..=92)
                };
            }
        }
        temp
    }

    fn check_fluid_levels(&mut self, faults: &mut FaultMemory, input: &mut ErrorInput, locked: bool) {
        if self.readout.act_ign > 2 {
            return;
        }
        let running = self.readout.rpm > RUNNING_RPM_THRESHOLD;
        let coolant_short = if running {
            self.readout.coolant_level < MIN_LEVEL_RUNNING
        } else {
            self.readout.coolant_level < MIN_LEVEL_IDLE
        };
        if coolant_short {
            fault::push_code(input, COOLANT_LEVEL_LOW);
            faults.raise(COOLANT_LEVEL_LOW, input, locked);
        }
        let oil_short = if running {
            self.readout.oil_level < MIN_LEVEL_RUNNING
        } else {
            self.readout.oil_level < MIN_LEVEL_IDLE
        };
        if oil_short {
            fault::push_code(input, OIL_LEVEL_LOW);
            faults.raise(OIL_LEVEL_LOW, input, locked);
        }
    }
}

/// Raise every injected injector code and count them. Each unique code costs
/// a fixed slice of power; two or more arm the ignition cutoff.
fn injector_fault_count(faults: &mut FaultMemory, input: &ErrorInput, locked: bool) -> usize {
    let mut count = 0;
    for code in catalog::INJECTOR_CODES {
        if input.contains(&code) {
            faults.raise(code, input, locked);
            count += 1;
        }
    }
    count
}

/// Idle jitter at released pedal, zero with a dead rpm sensor or ignition off,
/// otherwise linear in gear ratio and pedal with 1 % jitter, clamped at redline.
pub fn calc_rpm(gear: Gear, pedal: u32, ign: u8, rpm_fault: bool, rng: &mut impl Rng) -> i64 {
    if pedal == 0 {
        return rng.gen_range(790..=810);
    }
    if rpm_fault || ign == 0 {
        return 0;
    }
    let base = (gear.ratio() * f64::from(pedal) * PEDAL_RPM_GAIN + IDLE_RPM) as i64;
    let tolerance = (base as f64 * RPM_TOLERANCE) as i64;
    let rpm = rng.gen_range(base - tolerance..=base + tolerance);
    rpm.min(MAX_RPM)
}

/// Piecewise-linear interpolation over the power curve with 2 % jitter, minus
/// the injector penalty.
pub fn calc_power(rpm: i64, injector_loss: i64, rng: &mut impl Rng) -> i64 {
    let rpm = rpm as f64;
    let (first, last) = (POWER_CURVE[0], POWER_CURVE[POWER_CURVE.len() - 1]);
    if rpm <= first.0 {
        return first.1 as i64 - injector_loss;
    }
    if rpm >= last.0 {
        return last.1 as i64 - injector_loss;
    }
    for pair in POWER_CURVE.windows(2) {
        let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
        if x1 <= rpm && rpm < x2 {
            let power = (y1 + (rpm - x1) * (y2 - y1) / (x2 - x1)) as i64;
            let tolerance = (power as f64 * POWER_TOLERANCE) as i64;
            let jittered = rng.gen_range(power - tolerance..=power + tolerance);
            return jittered - injector_loss;
        }
    }
    last.1 as i64 - injector_loss
}

/// `power * 9549 / rpm` with an idle-band correction, a low-pedal offset, and
/// a jittered floor at creep pedal. Zero rpm short-circuits to zero.
pub fn calc_torque(rpm: i64, power: i64, pedal: u32, rng: &mut impl Rng) -> i64 {
    if rpm == 0 {
        return 0;
    }
    let mut torque = (power as f64 * TORQUE_FACTOR / rpm as f64) as i64;
    if (rpm as f64) < IDLE_BAND_RPM {
        torque -= 300;
    }
    if pedal < LOW_PEDAL_THRESHOLD {
        torque -= 200;
    }
    if pedal <= CREEP_PEDAL_THRESHOLD {
        torque = rng.gen_range(156..=166);
    }
    torque
}

/// Kinematic conversion through wheel radius and final drive; zero whenever
/// the drivetrain cannot move the car.
pub fn calc_speed(rpm: i64, gear: Gear) -> i64 {
    if rpm == 0 || !gear.drives_wheels() {
        return 0;
    }
    let ratio = gear.ratio();
    if ratio == 0.0 {
        return 0;
    }
    let speed_mps = (rpm as f64 * WHEEL_RADIUS_CM * 2.0 * std::f64::consts::PI)
        / (ratio * FINAL_DRIVE_RATIO * 6000.0);
    (speed_mps * 3.6) as i64
}

/// Fluid sensor readings keyed to the rpm band.
pub fn fluid_levels(rpm: i64, ign: u8, rng: &mut impl Rng) -> (i64, i64) {
    let running = (ign == 1 || ign == 2) && rpm > RUNNING_RPM_THRESHOLD;
    let coolant = if running {
        rng.gen_range(118..=122)
    } else {
        rng.gen_range(79..=81)
    };
    let oil = if running {
        rng.gen_range(118..=122)
    } else {
        rng.gen_range(79..=81)
    };
    (coolant, oil)
}

/// Linear consumption between idle and max rpm; suppressed entirely while the
/// fuel-reading fault is active or the ignition is off.
pub fn calc_fuel_consumption(rpm: i64, ign: u8, faults: &FaultMemory) -> f64 {
    if ign == 0 || faults.is_active(FUEL_CONSM_UNAVAILABLE) {
        return 0.0;
    }
    let a = (FUEL_MAX_LPH - FUEL_IDLE_LPH) / (FUEL_MAX_RPM - FUEL_IDLE_RPM);
    let b = FUEL_IDLE_LPH - a * FUEL_IDLE_RPM;
    let consumption = a * rpm as f64 + b;
    (consumption * 100.0).round() / 100.0
}
