//! Fault memory and fault log.
//!
//! Every code from the catalog is either absent, `Active`, or `Passive` in the
//! fault memory. The fault log counts activations per code and has its own
//! lifecycle. Transitions run once per cycle in [`FaultMemory::sweep`]; signal
//! models raise codes mid-cycle through [`FaultMemory::raise`].

use std::collections::BTreeMap;

use crate::catalog::{self, ErrorCode};

pub const MAX_ERROR_INPUT: usize = 64;

/// The ordered, possibly-duplicated list of codes seen this cycle: the
/// tester's injected codes plus everything the signal models appended.
pub type ErrorInput = heapless::Vec<ErrorCode, MAX_ERROR_INPUT>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultState {
    Active,
    Passive,
}

impl FaultState {
    pub fn as_str(self) -> &'static str {
        match self {
            FaultState::Active => "active",
            FaultState::Passive => "passive",
        }
    }
}

const MEMORY_DELETE_PREFIX: &str = "error_memory.";
const LOG_DELETE_PREFIX: &str = "error_log.";

/// Per-code fault state plus the activation counter log.
#[derive(Debug, Default)]
pub struct FaultMemory {
    memory: BTreeMap<ErrorCode, FaultState>,
    log: BTreeMap<ErrorCode, u32>,
}

impl FaultMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mid-cycle raise: insert the code as active if it is absent from memory
    /// and present in the error input. Locked memory never changes.
    pub fn raise(&mut self, code: ErrorCode, input: &ErrorInput, locked: bool) {
        if locked || !input.contains(&code) {
            return;
        }
        debug_assert!(catalog::contains(code), "raise of uncataloged code {:?}", code);
        self.memory.entry(code).or_insert(FaultState::Active);
    }

    pub fn state_of(&self, code: ErrorCode) -> Option<FaultState> {
        self.memory.get(&code).copied()
    }

    pub fn is_active(&self, code: ErrorCode) -> bool {
        self.state_of(code) == Some(FaultState::Active)
    }

    /// End-of-cycle transition pass:
    ///
    /// 1. absent -> active for every input code, first log entry created
    /// 2. passive -> active for re-seen codes, log incremented
    /// 3. active -> passive for codes no longer in the input
    ///
    /// With the management lock set, nothing moves.
    pub fn sweep(&mut self, input: &ErrorInput, locked: bool) {
        if locked {
            return;
        }
        for &code in input {
            if !catalog::contains(code) {
                continue;
            }
            match self.memory.get_mut(&code) {
                None => {
                    self.memory.insert(code, FaultState::Active);
                    *self.log.entry(code).or_insert(0) += 1;
                }
                Some(state @ FaultState::Passive) => {
                    *state = FaultState::Active;
                    *self.log.entry(code).or_insert(0) += 1;
                }
                Some(FaultState::Active) => {
                    // Raised mid-cycle without a log entry yet.
                    self.log.entry(code).or_insert(1);
                }
            }
        }
        for (code, state) in &mut self.memory {
            if !input.contains(code) {
                *state = FaultState::Passive;
            }
        }
    }

    /// Administrative clear of the fault memory. The single-entry delete
    /// (dotted path `error_memory.<Name>`) runs before the bulk flag; both are
    /// independent of the management lock. Unknown targets are a no-op.
    pub fn clear_memory(&mut self, clear_all: bool, delete_target: &str) {
        if let Some(name) = delete_target.strip_prefix(MEMORY_DELETE_PREFIX) {
            if let Some(code) = catalog::code_of(name) {
                self.memory.remove(&code);
            }
        }
        if clear_all {
            self.memory.clear();
        }
    }

    /// Administrative clear of the fault log, same rules as [`Self::clear_memory`].
    pub fn clear_log(&mut self, clear_all: bool, delete_target: &str) {
        if let Some(name) = delete_target.strip_prefix(LOG_DELETE_PREFIX) {
            if let Some(code) = catalog::code_of(name) {
                self.log.remove(&code);
            }
        }
        if clear_all {
            self.log.clear();
        }
    }

    pub fn memory(&self) -> &BTreeMap<ErrorCode, FaultState> {
        &self.memory
    }

    pub fn log(&self) -> &BTreeMap<ErrorCode, u32> {
        &self.log
    }

    /// Name-keyed view of the fault memory for the output boundary.
    pub fn memory_by_name(&self) -> BTreeMap<String, String> {
        self.memory
            .iter()
            .filter_map(|(code, state)| {
                catalog::name_of(*code).map(|n| (n.to_string(), state.as_str().to_string()))
            })
            .collect()
    }

    /// Name-keyed view of the fault log for the output boundary.
    pub fn log_by_name(&self) -> BTreeMap<String, u32> {
        self.log
            .iter()
            .filter_map(|(code, count)| catalog::name_of(*code).map(|n| (n.to_string(), *count)))
            .collect()
    }
}

/// Append a code to the error input. A full buffer drops the code; the cycle
/// must go on regardless.
pub fn push_code(input: &mut ErrorInput, code: ErrorCode) {
    let _ = input.push(code);
}

/// Append a code only if it is not present yet.
pub fn push_unique(input: &mut ErrorInput, code: ErrorCode) {
    if !input.contains(&code) {
        push_code(input, code);
    }
}

/// Deduplicate the error input, keeping the first occurrence of each code in
/// order. Idempotent.
pub fn dedup(input: &mut ErrorInput) {
    let mut seen: ErrorInput = heapless::Vec::new();
    for &code in input.iter() {
        if !seen.contains(&code) {
            let _ = seen.push(code);
        }
    }
    *input = seen;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{
        COOLANT_LEVEL_LOW, IGNITION_MALFUNCTION, OIL_LEVEL_LOW, RPM_SENSOR_MALFUNCTION,
    };

    fn input_of(codes: &[ErrorCode]) -> ErrorInput {
        let mut input = ErrorInput::new();
        for &code in codes {
            push_code(&mut input, code);
        }
        input
    }

    #[test]
    fn test_first_observation_activates_and_logs() {
        let mut faults = FaultMemory::new();
        faults.sweep(&input_of(&[OIL_LEVEL_LOW]), false);

        assert!(faults.is_active(OIL_LEVEL_LOW));
        assert_eq!(faults.log().get(&OIL_LEVEL_LOW), Some(&1));
    }

    #[test]
    fn test_active_then_passive_then_reactivated() {
        let mut faults = FaultMemory::new();
        faults.sweep(&input_of(&[OIL_LEVEL_LOW]), false);
        faults.sweep(&ErrorInput::new(), false);
        assert_eq!(faults.state_of(OIL_LEVEL_LOW), Some(FaultState::Passive));

        faults.sweep(&input_of(&[OIL_LEVEL_LOW]), false);
        assert!(faults.is_active(OIL_LEVEL_LOW));
        assert_eq!(faults.log().get(&OIL_LEVEL_LOW), Some(&2));
    }

    #[test]
    fn test_lock_freezes_memory_and_log() {
        let mut faults = FaultMemory::new();
        faults.sweep(&input_of(&[OIL_LEVEL_LOW]), false);

        for _ in 0..5 {
            faults.sweep(&input_of(&[COOLANT_LEVEL_LOW]), true);
            faults.sweep(&ErrorInput::new(), true);
        }
        assert!(faults.is_active(OIL_LEVEL_LOW));
        assert_eq!(faults.state_of(COOLANT_LEVEL_LOW), None);
        assert_eq!(faults.log().len(), 1);
    }

    #[test]
    fn test_raise_requires_presence_in_input() {
        let mut faults = FaultMemory::new();
        faults.raise(IGNITION_MALFUNCTION, &ErrorInput::new(), false);
        assert_eq!(faults.state_of(IGNITION_MALFUNCTION), None);

        let input = input_of(&[IGNITION_MALFUNCTION]);
        faults.raise(IGNITION_MALFUNCTION, &input, true);
        assert_eq!(faults.state_of(IGNITION_MALFUNCTION), None);

        faults.raise(IGNITION_MALFUNCTION, &input, false);
        assert!(faults.is_active(IGNITION_MALFUNCTION));
        // Log entry appears with the sweep, not the raise.
        assert!(faults.log().is_empty());
        faults.sweep(&input, false);
        assert_eq!(faults.log().get(&IGNITION_MALFUNCTION), Some(&1));
    }

    #[test]
    fn test_clear_one_then_clear_all() {
        let mut faults = FaultMemory::new();
        faults.sweep(&input_of(&[OIL_LEVEL_LOW, COOLANT_LEVEL_LOW]), false);

        faults.clear_memory(false, "error_memory.EngErr_OilLvlLow");
        assert_eq!(faults.state_of(OIL_LEVEL_LOW), None);
        assert!(faults.is_active(COOLANT_LEVEL_LOW));

        faults.clear_memory(true, "");
        assert!(faults.memory().is_empty());
        // Log untouched by memory clears
        assert_eq!(faults.log().len(), 2);

        faults.clear_log(false, "error_log.EngErr_CoolLvlLow");
        assert_eq!(faults.log().get(&COOLANT_LEVEL_LOW), None);
        faults.clear_log(true, "");
        assert!(faults.log().is_empty());
    }

    #[test]
    fn test_delete_of_unknown_target_is_noop() {
        let mut faults = FaultMemory::new();
        faults.sweep(&input_of(&[OIL_LEVEL_LOW]), false);

        faults.clear_memory(false, "error_memory.EngErr_NoSuchThing");
        faults.clear_memory(false, "something_else.EngErr_OilLvlLow");
        assert!(faults.is_active(OIL_LEVEL_LOW));
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_order() {
        let mut input = input_of(&[
            OIL_LEVEL_LOW,
            COOLANT_LEVEL_LOW,
            OIL_LEVEL_LOW,
            RPM_SENSOR_MALFUNCTION,
            COOLANT_LEVEL_LOW,
        ]);
        dedup(&mut input);
        assert_eq!(
            input.as_slice(),
            &[OIL_LEVEL_LOW, COOLANT_LEVEL_LOW, RPM_SENSOR_MALFUNCTION]
        );
    }

    #[test]
    fn test_dedup_is_idempotent() {
        let mut input = input_of(&[OIL_LEVEL_LOW, COOLANT_LEVEL_LOW, OIL_LEVEL_LOW]);
        dedup(&mut input);
        let once = input.clone();
        dedup(&mut input);
        assert_eq!(input, once);
    }
}
