// Wire model serialization tests: push envelope shape and field casing

use thermocast::models::{
    HardwareClass, HeartbeatData, InstallReport, MetricsSummary, MilestoneData, NewInstallData,
    PushMessage, ThermalSnapshot, ThermalState,
};

fn sample_summary() -> MetricsSummary {
    MetricsSummary {
        total_installs: 1247,
        active_instances: 1156,
        p95_latency: 187.0,
        p99_latency: 245.0,
        reliability: 99.94,
        countries: 7,
        installs_per_hour: 47,
        hw_events: 12_400,
        avg_temp: 42.0,
        last_update: 1_700_000_000_000,
        seq: 3,
    }
}

#[test]
fn test_heartbeat_envelope() {
    let msg = PushMessage::Heartbeat(HeartbeatData {
        active_instances: 1156,
        p95_latency: 187.0,
        installs_per_hour: 47,
    });
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(v["type"], "heartbeat");
    assert_eq!(v["data"]["activeInstances"], 1156);
    assert_eq!(v["data"]["p95Latency"], 187.0);
    assert_eq!(v["data"]["installsPerHour"], 47);
}

#[test]
fn test_new_install_envelope_omits_missing_country() {
    let msg = PushMessage::NewInstall(NewInstallData {
        global_installs: 1248,
        country: None,
    });
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(v["type"], "new_install");
    assert_eq!(v["data"]["globalInstalls"], 1248);
    assert!(v["data"].get("country").is_none());
}

#[test]
fn test_new_install_roundtrip() {
    let json = r#"{"type":"new_install","data":{"globalInstalls":2501,"country":"BR"}}"#;
    let msg: PushMessage = serde_json::from_str(json).unwrap();
    match msg {
        PushMessage::NewInstall(n) => {
            assert_eq!(n.global_installs, 2501);
            assert_eq!(n.country.as_deref(), Some("BR"));
        }
        other => panic!("expected new_install, got {other:?}"),
    }
}

#[test]
fn test_milestone_envelope() {
    let msg = PushMessage::Milestone(MilestoneData {
        threshold: 2500,
        message: "Movement reaches critical mass".into(),
        installs: 2501,
        p95_latency: 187.0,
        reliability: 99.94,
    });
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(v["type"], "milestone");
    assert_eq!(v["data"]["threshold"], 2500);
    assert_eq!(v["data"]["message"], "Movement reaches critical mass");
    assert_eq!(v["data"]["installs"], 2501);
}

#[test]
fn test_full_update_envelope_uses_camel_case() {
    let msg = PushMessage::FullUpdate(sample_summary());
    let v = serde_json::to_value(&msg).unwrap();
    assert_eq!(v["type"], "full_update");
    assert_eq!(v["data"]["totalInstalls"], 1247);
    assert_eq!(v["data"]["hwEvents"], 12_400);
    assert_eq!(v["data"]["lastUpdate"], 1_700_000_000_000u64);
    assert_eq!(v["data"]["seq"], 3);
}

#[test]
fn test_summary_roundtrip() {
    let summary = sample_summary();
    let json = serde_json::to_string(&summary).unwrap();
    let back: MetricsSummary = serde_json::from_str(&json).unwrap();
    assert_eq!(back, summary);
}

#[test]
fn test_install_report_all_fields_optional() {
    let report: InstallReport = serde_json::from_str("{}").unwrap();
    assert!(report.country.is_none());
    assert!(report.version.is_none());
    assert!(report.platform.is_none());
}

#[test]
fn test_thermal_snapshot_serialization() {
    let snapshot = ThermalSnapshot {
        cpu_temperature_c: None,
        gpu_temperature_c: Some(48.5),
        fan_speeds_rpm: vec![4000.0],
        thermal_state: ThermalState::Nominal,
        thermal_pressure_level: 0,
        hardware_class: HardwareClass::ClassA,
        captured_at: 1_700_000_000_000,
        ok: true,
        diagnostic: None,
    };
    let v = serde_json::to_value(&snapshot).unwrap();
    assert!(v["cpuTemperatureC"].is_null());
    assert_eq!(v["gpuTemperatureC"], 48.5);
    assert_eq!(v["fanSpeedsRpm"][0], 4000.0);
    assert_eq!(v["thermalState"], "Nominal");
    assert_eq!(v["hardwareClass"], "ClassA");
    assert_eq!(v["ok"], true);
    // diagnostic is omitted entirely when absent
    assert!(v.get("diagnostic").is_none());
}
