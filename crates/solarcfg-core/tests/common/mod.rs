use serde_json::{json, Value};
use solarcfg_core::catalog::{BATTERY_PROFILE, CHARGING_PARAMETERS};
use solarcfg_core::SnapshotStore;

/// Battery profile as the controller reports it
#[allow(dead_code)]
pub fn battery_profile(battery_type: &str) -> Value {
    json!({"batteryType": battery_type, "batteryCapacity": 100})
}

/// Charging parameters satisfying every voltage rule
#[allow(dead_code)]
pub fn charging_parameters() -> Value {
    json!({
        "boostDuration": 120,
        "boostReconnectChargingVoltage": 13.2,
        "boostVoltage": 14.4,
        "chargingLimitVoltage": 15.0,
        "dischargingLimitVoltage": 10.6,
        "equalizationCycle": 30,
        "equalizationDuration": 120,
        "equalizationVoltage": 14.6,
        "floatVoltage": 13.8,
        "lowVoltDisconnectVoltage": 11.1,
        "lowVoltReconnectVoltage": 12.6,
        "overVoltDisconnectVoltage": 16.0,
        "overVoltReconnectVoltage": 15.0,
        "underVoltWarningReconnectVoltage": 12.2,
        "underVoltWarningVoltage": 12.0,
        "batteryTempUpperLimit": 65.0,
        "batteryTempLowerLimit": -40.0,
        "controllerTempUpperLimit": 85.0,
        "controllerTempLowerLimit": -40.0
    })
}

#[allow(dead_code)]
pub fn profile_store(battery_type: &str) -> SnapshotStore {
    let mut store = SnapshotStore::new(&BATTERY_PROFILE);
    store.load_from(battery_profile(battery_type)).unwrap();
    store
}

#[allow(dead_code)]
pub fn params_store() -> SnapshotStore {
    let mut store = SnapshotStore::new(&CHARGING_PARAMETERS);
    store.load_from(charging_parameters()).unwrap();
    store
}
