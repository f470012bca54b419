use rand::rngs::StdRng;
use rand::SeedableRng;

use ecusim::mailbox::Mailbox;
use ecusim::protocol::{InputFrame, Snapshot};
use ecusim::{EcuAgent, EcuConfig};

fn debug_agent(seed: u64) -> EcuAgent {
    let config = EcuConfig {
        debug_access: true,
        ..EcuConfig::default()
    };
    EcuAgent::with_rng(config, StdRng::seed_from_u64(seed))
}

fn inject(names: &[&str]) -> InputFrame {
    InputFrame {
        error_injection: names.iter().map(|n| n.to_string()).collect(),
        ..InputFrame::default()
    }
}

#[cfg(test)]
mod cycle_tests {
    use super::*;

    #[test]
    fn test_idle_cycle_snapshot_ranges() {
        let mut agent = debug_agent(1);
        let snapshot = agent.run_cycle(&InputFrame::default());

        // Engine starts keyed off, so the supply sees ignition 0 this cycle
        assert!(snapshot.power_supply >= 11.9 && snapshot.power_supply <= 12.1);
        assert!((790..=810).contains(&snapshot.engine_info.rpm));
        assert_eq!(snapshot.engine_info.speed, 0);
        assert!((156..=166).contains(&snapshot.engine_info.torque));
        assert_eq!(snapshot.engine_info.gear, "N");
        assert_eq!(snapshot.ign_stat, "1_IGN");
        assert!(snapshot.engine_info.fuel_consumption > 0.0);
        assert!(snapshot.error_memory.is_empty());
        assert!(snapshot.error_log.is_empty());
        assert!(!snapshot.time_stamp.is_empty());

        // Next cycle the supply tracks the ignition-on state
        let snapshot = agent.run_cycle(&InputFrame::default());
        assert!(snapshot.power_supply >= 12.9 && snapshot.power_supply <= 13.1);
    }

    #[test]
    fn test_driving_cycle_reads_back_acc() {
        let mut agent = debug_agent(2);
        let input = InputFrame {
            gear: "3".to_string(),
            pedal_lvl: 50,
            ..InputFrame::default()
        };
        let snapshot = agent.run_cycle(&input);

        assert_eq!(snapshot.ign_stat, "2_ACC");
        assert_eq!(snapshot.engine_info.gear, "3");
        assert_eq!(snapshot.engine_info.pedal_lvl, 50);
        assert!(snapshot.engine_info.rpm > 3000);
        assert!(snapshot.engine_info.speed > 0);
        assert!(snapshot.engine_info.power > 0);
        assert!(snapshot.real_rpm > 3000);
    }

    #[test]
    fn test_ignition_off_zeroes_telemetry() {
        let mut agent = debug_agent(3);
        let input = InputFrame {
            gear: "3".to_string(),
            pedal_lvl: 50,
            ign_stat: 0,
            ..InputFrame::default()
        };
        let snapshot = agent.run_cycle(&input);

        assert_eq!(snapshot.ign_stat, "0_OFF");
        assert_eq!(snapshot.engine_info.rpm, 0);
        assert_eq!(snapshot.engine_info.speed, 0);
        assert_eq!(snapshot.engine_info.fuel_consumption, 0.0);
    }
}

#[cfg(test)]
mod fault_lifecycle_tests {
    use super::*;

    #[test]
    fn test_injected_fault_activates_then_passivates() {
        let mut agent = debug_agent(10);

        // Cycle 1: the injected code lands active and is echoed in the input
        let snapshot = agent.run_cycle(&inject(&["EngErr_SpdmtrFault"]));
        assert_eq!(
            snapshot.error_memory.get("EngErr_SpdmtrFault").map(String::as_str),
            Some("active")
        );
        assert_eq!(snapshot.error_input, vec!["EngErr_SpdmtrFault".to_string()]);
        assert_eq!(snapshot.engine_info.speed, 0);

        // Cycle 2: still active after the first sweep, counted once
        let snapshot = agent.run_cycle(&InputFrame::default());
        assert_eq!(
            snapshot.error_memory.get("EngErr_SpdmtrFault").map(String::as_str),
            Some("active")
        );
        assert_eq!(snapshot.error_log.get("EngErr_SpdmtrFault"), Some(&1));

        // Cycle 3: the code stopped arriving, so it passivated
        let snapshot = agent.run_cycle(&InputFrame::default());
        assert_eq!(
            snapshot.error_memory.get("EngErr_SpdmtrFault").map(String::as_str),
            Some("passive")
        );
        assert_eq!(snapshot.error_log.get("EngErr_SpdmtrFault"), Some(&1));
    }

    #[test]
    fn test_reinjection_increments_log() {
        let mut agent = debug_agent(11);

        agent.run_cycle(&inject(&["EngErr_OilLvlLow"]));
        agent.run_cycle(&InputFrame::default());
        agent.run_cycle(&InputFrame::default());
        agent.run_cycle(&inject(&["EngErr_OilLvlLow"]));
        let snapshot = agent.run_cycle(&InputFrame::default());

        assert_eq!(snapshot.error_log.get("EngErr_OilLvlLow"), Some(&2));
    }

    #[test]
    fn test_management_lock_freezes_fault_memory() {
        let mut agent = debug_agent(12);

        let mut input = inject(&["EngErr_SpdmtrFault"]);
        input.can_handle_error_manager = true;
        let snapshot = agent.run_cycle(&input);

        assert!(snapshot.error_memory.is_empty());
        assert!(snapshot.error_log.is_empty());
        // The injected code still flows through the cycle input
        assert_eq!(snapshot.error_input, vec!["EngErr_SpdmtrFault".to_string()]);
        assert!(agent.faults().memory().is_empty());
    }

    #[test]
    fn test_clear_memory_spares_log() {
        let mut agent = debug_agent(13);

        agent.run_cycle(&inject(&["EngErr_OilLvlLow"]));
        let mut input = InputFrame::default();
        input.clear_error_memory = true;
        agent.run_cycle(&input);

        let snapshot = agent.run_cycle(&InputFrame::default());
        assert!(!snapshot.error_memory.contains_key("EngErr_OilLvlLow"));
        assert_eq!(snapshot.error_log.get("EngErr_OilLvlLow"), Some(&1));
    }

    #[test]
    fn test_single_entry_delete_via_dotted_path() {
        let mut agent = debug_agent(14);

        agent.run_cycle(&inject(&["EngErr_OilLvlLow", "EngErr_CoolLvlLow"]));
        let mut input = InputFrame::default();
        input.parameter_to_delete = "error_memory.EngErr_OilLvlLow".to_string();
        agent.run_cycle(&input);

        let snapshot = agent.run_cycle(&InputFrame::default());
        assert!(!snapshot.error_memory.contains_key("EngErr_OilLvlLow"));
        assert!(snapshot.error_memory.contains_key("EngErr_CoolLvlLow"));
    }

    #[test]
    fn test_double_injector_fault_stalls_next_cycle() {
        let mut agent = debug_agent(15);

        let mut input = inject(&[
            "EngErr_Malfunction_Injector_1",
            "EngErr_Malfunction_Injector_2",
        ]);
        input.gear = "3".to_string();
        input.pedal_lvl = 50;
        let snapshot = agent.run_cycle(&input);
        assert_eq!(snapshot.ign_stat, "2_ACC");
        assert!(snapshot.engine_info.rpm > 0);

        let driving = InputFrame {
            gear: "3".to_string(),
            pedal_lvl: 50,
            ..InputFrame::default()
        };
        let snapshot = agent.run_cycle(&driving);
        assert_eq!(snapshot.ign_stat, "0_OFF");
        assert_eq!(snapshot.engine_info.rpm, 0);
        assert_eq!(snapshot.engine_info.speed, 0);
    }

    #[test]
    fn test_sustained_injector_faults_keep_engine_stalled() {
        let mut agent = debug_agent(17);

        let mut input = inject(&[
            "EngErr_Malfunction_Injector_1",
            "EngErr_Malfunction_Injector_2",
        ]);
        input.gear = "3".to_string();
        input.pedal_lvl = 50;

        // First cycle runs while the cutoff arms
        let snapshot = agent.run_cycle(&input);
        assert_eq!(snapshot.ign_stat, "2_ACC");

        // Every following cycle stays off as long as both codes arrive
        for _ in 0..3 {
            let snapshot = agent.run_cycle(&input);
            assert_eq!(snapshot.ign_stat, "0_OFF");
            assert_eq!(snapshot.engine_info.rpm, 0);
            assert_eq!(snapshot.engine_info.speed, 0);
        }
    }

    #[test]
    fn test_undervoltage_cascades_into_ignition_malfunction() {
        let mut agent = debug_agent(16);

        let stalled = InputFrame {
            manipulate_voltage: -9.0,
            ..InputFrame::default()
        };
        agent.run_cycle(&stalled);
        let snapshot = agent.run_cycle(&stalled);

        assert!(snapshot.error_memory.contains_key("ElErr_Undervoltage"));
        assert!(snapshot.error_memory.contains_key("ComErr_CanErr_Undervoltage"));
        assert_eq!(
            snapshot.error_memory.get("EngErr_IgnMalfunction").map(String::as_str),
            Some("active")
        );
        assert_eq!(snapshot.ign_stat, "0_OFF");
        assert_eq!(snapshot.engine_info.rpm, 0);
    }
}

#[cfg(test)]
mod mailbox_tests {
    use super::*;

    fn temp_mailbox(tag: &str) -> Mailbox {
        let dir = std::env::temp_dir().join(format!("ecusim-test-{}-{}", tag, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        Mailbox::new(dir.join("OBD_2_INPUT.json"), dir.join("OBD_2_OUTPUT.json"))
    }

    #[test]
    fn test_missing_input_yields_defaults() {
        let mailbox = temp_mailbox("missing");
        let frame = mailbox.read_input();
        assert_eq!(frame.gear, "N");
        assert_eq!(frame.ign_stat, 1);
        assert!(frame.security_access.auth_request);
    }

    #[test]
    fn test_corrupt_input_yields_defaults() {
        let mailbox = temp_mailbox("corrupt");
        std::fs::write(mailbox.input_path(), "{not json").unwrap();
        let frame = mailbox.read_input();
        assert_eq!(frame.gear, "N");
        assert_eq!(frame.pedal_lvl, 0);
    }

    #[test]
    fn test_snapshot_record_is_replaced_not_appended() {
        let mailbox = temp_mailbox("replace");
        let mut agent = debug_agent(20);

        for _ in 0..3 {
            let snapshot = agent.run_cycle(&InputFrame::default());
            mailbox.write_snapshot(&snapshot).unwrap();
        }

        // Still exactly one well-formed record
        let raw = std::fs::read_to_string(mailbox.output_path()).unwrap();
        let parsed: Snapshot = serde_json::from_str(&raw).unwrap();
        assert!((790..=810).contains(&parsed.engine_info.rpm));
        assert!(!std::path::Path::new(&mailbox.output_path().with_extension("json.tmp")).exists());
    }

    #[test]
    fn test_round_trip_through_files() {
        let mailbox = temp_mailbox("roundtrip");
        std::fs::write(
            mailbox.input_path(),
            r#"{"gear": "3", "pedal_lvl": 60, "error_injection": ["EngErr_SpdmtrFault"]}"#,
        )
        .unwrap();

        let mut agent = debug_agent(21);
        let frame = mailbox.read_input();
        let snapshot = agent.run_cycle(&frame);
        mailbox.write_snapshot(&snapshot).unwrap();

        let raw = std::fs::read_to_string(mailbox.output_path()).unwrap();
        let parsed: Snapshot = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed.engine_info.gear, "3");
        assert_eq!(parsed.engine_info.speed, 0);
        assert_eq!(
            parsed.error_memory.get("EngErr_SpdmtrFault").map(String::as_str),
            Some("active")
        );
    }
}
