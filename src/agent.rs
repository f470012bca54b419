//! Cycle orchestration.
//!
//! [`EcuAgent`] owns every stateful component and runs one fixed-period cycle
//! at a time: security gate, power supply, engine, snapshot assembly, then
//! the fault-memory bookkeeping (sweep, administrative clears, error-input
//! dedup). The mailbox and the timer live with the caller; the agent itself
//! never blocks and never fails.

use std::collections::BTreeMap;

use chrono::Local;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use crate::catalog;
use crate::config::EcuConfig;
use crate::fault::{self, ErrorInput, FaultMemory};
use crate::protocol::{
    EngineInfo, InputFrame, SecurityStatus, Snapshot, SENTINEL_NUMERIC, SENTINEL_TEXT,
};
use crate::security::{SecurityGate, SecurityState};
use crate::systems::{ign_label, DriverInputs, Engine, Gear, PowerSupply};

pub struct EcuAgent {
    engine: Engine,
    supply: PowerSupply,
    faults: FaultMemory,
    gate: SecurityGate,
    error_input: ErrorInput,
    cycle_count: u64,
    rng: StdRng,
}

impl EcuAgent {
    pub fn new(config: EcuConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic construction for tests.
    pub fn with_rng(config: EcuConfig, rng: StdRng) -> Self {
        Self {
            engine: Engine::new(),
            supply: PowerSupply::new(),
            faults: FaultMemory::new(),
            gate: SecurityGate::new(config.seed_spec(), config.debug_access),
            error_input: ErrorInput::new(),
            cycle_count: 0,
            rng,
        }
    }

    /// One simulation cycle: returns the snapshot to publish.
    pub fn run_cycle(&mut self, input: &InputFrame) -> Snapshot {
        let locked = input.can_handle_error_manager;

        let mut error_input = ErrorInput::new();
        for name in &input.error_injection {
            match catalog::code_of(name) {
                Some(code) => fault::push_code(&mut error_input, code),
                None => warn!("ignoring unknown injected error '{name}'"),
            }
        }

        self.gate.update(
            input.security_access.auth_request,
            input.security_access.key,
            &mut self.rng,
        );

        // The supply sees the ignition state the engine read back last cycle.
        let voltage = self.supply.update(
            self.engine.act_ign(),
            input.manipulate_voltage,
            &mut self.faults,
            &mut error_input,
            locked,
            &mut self.rng,
        );

        let driver = DriverInputs {
            gear: Gear::parse(&input.gear),
            pedal: input.pedal_lvl,
            ign_stat: input.ign_stat,
            coolant_offset: input.manipulate_coolant_levels,
            oil_offset: input.manipulate_oil_levels,
        };
        self.engine
            .update(&driver, &mut self.faults, &mut error_input, locked, &mut self.rng);

        let snapshot = self.build_snapshot(input, voltage, &error_input);

        // End-of-cycle bookkeeping, after every consumer has read the input.
        self.faults.sweep(&error_input, locked);
        self.faults
            .clear_memory(input.clear_error_memory, &input.parameter_to_delete);
        self.faults
            .clear_log(input.clear_error_log, &input.parameter_to_delete);
        fault::dedup(&mut error_input);
        self.error_input = error_input;
        self.cycle_count += 1;

        debug!(
            cycle = self.cycle_count,
            access = self.gate.state().label(),
            rpm = self.engine.readout().rpm,
            faults = self.faults.memory().len(),
            "cycle complete"
        );

        snapshot
    }

    fn build_snapshot(&self, input: &InputFrame, voltage: f64, error_input: &ErrorInput) -> Snapshot {
        let state = self.gate.state();
        let security_access = SecurityStatus {
            auth_response: (state.code(), state.label().to_string()),
            auth_request: input.security_access.auth_request,
            seed: self.gate.seed(),
            key: input.security_access.key,
        };
        let time_stamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();

        if state == SecurityState::Unlocked {
            let out = self.engine.readout();
            Snapshot {
                ign_stat: ign_label(out.act_ign).to_string(),
                power_supply: voltage,
                engine_info: EngineInfo {
                    rpm: out.rpm,
                    speed: out.speed,
                    gear: input.gear.clone(),
                    power: out.power,
                    torque: out.torque,
                    fuel_consumption: out.fuel_consumption,
                    coolant_temp: out.coolant_temp,
                    coolant_level: out.coolant_level,
                    oil_level: out.oil_level,
                    pedal_lvl: i64::from(input.pedal_lvl),
                },
                error_log: self.faults.log_by_name(),
                error_input: error_input
                    .iter()
                    .filter_map(|code| catalog::name_of(*code))
                    .map(str::to_string)
                    .collect(),
                error_memory: self.faults.memory_by_name(),
                can_handle_error_manager: input.can_handle_error_manager,
                clear_error_memory: input.clear_error_memory,
                clear_error_log: input.clear_error_log,
                security_access,
                time_stamp,
                real_rpm: out.real_rpm,
            }
        } else {
            Snapshot {
                ign_stat: SENTINEL_TEXT.to_string(),
                power_supply: SENTINEL_NUMERIC as f64,
                engine_info: EngineInfo::sentinel(),
                error_log: BTreeMap::new(),
                error_input: Vec::new(),
                error_memory: BTreeMap::new(),
                can_handle_error_manager: input.can_handle_error_manager,
                clear_error_memory: input.clear_error_memory,
                clear_error_log: input.clear_error_log,
                security_access,
                time_stamp,
                real_rpm: SENTINEL_NUMERIC,
            }
        }
    }

    pub fn security_state(&self) -> SecurityState {
        self.gate.state()
    }

    pub fn pending_seed(&self) -> Option<u64> {
        self.gate.seed()
    }

    pub fn faults(&self) -> &FaultMemory {
        &self.faults
    }

    /// Deduplicated error input left by the last cycle.
    pub fn error_input(&self) -> &ErrorInput {
        &self.error_input
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }
}
