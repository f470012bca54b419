//! Security access: seed/key challenge-response.
//!
//! A tester requests authentication, receives a seed (ECU identifier prefix
//! followed by random non-zero digits), and must answer with a key carrying
//! the same prefix and the digit-wise 10's complement of the suffix. Until the
//! gate is unlocked, published snapshots carry only the sentinel values.
//!
//! [`SeedSpec::generate_key`] is the tester-side counterpart of the verifier
//! and is kept here so both sides of the handshake stay bit-compatible.

use rand::Rng;

/// Security-access state, published as `(code, label)` in every snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityState {
    Locked,
    Unlocked,
    Denied,
}

impl SecurityState {
    pub fn code(self) -> u8 {
        match self {
            SecurityState::Locked => 0,
            SecurityState::Unlocked => 1,
            SecurityState::Denied => 2,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SecurityState::Locked => "Security_Access_LOCKED",
            SecurityState::Unlocked => "Security_Access_UNLOCKED",
            SecurityState::Denied => "Security_Access_DENIED",
        }
    }
}

/// Seed geometry: a fixed ECU identifier prefix and the width of the random
/// suffix. Software revisions differ only in these two parameters.
#[derive(Debug, Clone, Copy)]
pub struct SeedSpec {
    pub ecu_id: u32,
    pub suffix_digits: u32,
}

impl Default for SeedSpec {
    fn default() -> Self {
        Self {
            ecu_id: 8978,
            suffix_digits: 15,
        }
    }
}

impl SeedSpec {
    pub fn id_digits(&self) -> u32 {
        let mut n = self.ecu_id.max(1);
        let mut digits = 0;
        while n > 0 {
            n /= 10;
            digits += 1;
        }
        digits
    }

    pub fn total_digits(&self) -> u32 {
        self.id_digits() + self.suffix_digits
    }

    /// Largest seed this spec can produce, `None` when it overflows u64.
    /// Config validation rejects such widths up front.
    pub fn max_seed(&self) -> Option<u64> {
        let mut seed = u64::from(self.ecu_id);
        for _ in 0..self.suffix_digits {
            seed = seed.checked_mul(10)?.checked_add(9)?;
        }
        Some(seed)
    }

    /// Identifier prefix followed by `suffix_digits` random digits, each drawn
    /// from 1..=9 so the 10's complement stays a single digit.
    pub fn generate_seed(&self, rng: &mut impl Rng) -> u64 {
        let mut seed = u64::from(self.ecu_id);
        for _ in 0..self.suffix_digits {
            seed = seed * 10 + rng.gen_range(1..=9u64);
        }
        seed
    }

    /// Tester-side key derivation: same prefix, each suffix digit replaced by
    /// `10 - digit`.
    pub fn generate_key(&self, seed: u64) -> u64 {
        let pow = 10u64.pow(self.suffix_digits);
        let prefix = seed / pow;
        let mut suffix = seed % pow;
        let mut complement = 0u64;
        let mut place = 1u64;
        for _ in 0..self.suffix_digits {
            let digit = suffix % 10;
            complement += (10 - digit) * place;
            suffix /= 10;
            place *= 10;
        }
        prefix * pow + complement
    }

    /// Verifier: total digit lengths must match the spec exactly, and every
    /// suffix position must satisfy `seed_digit + key_digit == 10`. Any
    /// mismatch fails; a failed check is a protocol outcome, not an error.
    pub fn verify_key(&self, seed: u64, key: u64) -> bool {
        let seed_str = seed.to_string();
        let key_str = key.to_string();
        let total = self.total_digits() as usize;
        if seed_str.len() != total || key_str.len() != total {
            return false;
        }
        let split = total - self.suffix_digits as usize;
        seed_str.bytes().skip(split).zip(key_str.bytes().skip(split)).all(|(s, k)| {
            let s = u32::from(s - b'0');
            let k = u32::from(k - b'0');
            s + k == 10
        })
    }
}

/// The per-cycle security-access state machine.
#[derive(Debug)]
pub struct SecurityGate {
    spec: SeedSpec,
    state: SecurityState,
    seed: Option<u64>,
    debug_access: bool,
}

impl SecurityGate {
    /// `debug_access` presets the gate to unlocked without a handshake.
    pub fn new(spec: SeedSpec, debug_access: bool) -> Self {
        Self {
            spec,
            state: if debug_access {
                SecurityState::Unlocked
            } else {
                SecurityState::Locked
            },
            seed: None,
            debug_access,
        }
    }

    pub fn state(&self) -> SecurityState {
        self.state
    }

    /// Pending seed; `None` before the first request, 0 once consumed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn spec(&self) -> &SeedSpec {
        &self.spec
    }

    /// One cycle of the protocol. A request with no pending seed generates
    /// one; a non-zero key against a pending seed is verified and either
    /// unlocks the gate (consuming the seed) or denies. Without a request, a
    /// lingering non-zero key denies and a zero key locks, unless the debug
    /// bypass is active.
    pub fn update(&mut self, auth_request: bool, key: u64, rng: &mut impl Rng) {
        if auth_request {
            if self.seed.is_none() {
                self.seed = Some(self.spec.generate_seed(rng));
            }
            let pending = self.seed.filter(|s| *s != 0);
            if key != 0 {
                if let Some(seed) = pending {
                    if self.spec.verify_key(seed, key) {
                        self.state = SecurityState::Unlocked;
                        self.seed = Some(0);
                    } else {
                        self.state = SecurityState::Denied;
                    }
                }
            }
        } else if !self.debug_access {
            self.state = if key != 0 {
                SecurityState::Denied
            } else {
                SecurityState::Locked
            };
        }
    }
}
