//! Change-set computation against the controller's resources.
//!
//! All tests operate on in-memory snapshot stores (no I/O).

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{params_store, profile_store};
use serde_json::json;
use solarcfg_core::catalog::CHARGING_GATE;
use solarcfg_core::errors::{ExErrorKind, ReconcileError};
use solarcfg_core::{ExError, GateState};

// ---------------------------------------------------------------------------
// Battery profile
// ---------------------------------------------------------------------------

#[test]
fn test_unedited_profile_yields_empty_change_set() {
    let store = profile_store("sealed");
    let change_set = store.change_set(&GateState::Open).unwrap();
    assert!(change_set.is_empty());
    assert!(change_set.withheld.is_empty());
}

#[test]
fn test_switching_to_user_defined_sends_only_battery_type() {
    let mut store = profile_store("sealed");
    store.set_field("batteryType", json!("userDefined")).unwrap();

    let change_set = store.change_set(&GateState::Open).unwrap();
    assert_eq!(change_set.resource, "battery-profile");
    assert_eq!(change_set.to_payload(), json!({"batteryType": "userDefined"}));
}

#[test]
fn test_capacity_typed_as_text_is_submitted_as_int() {
    let mut store = profile_store("sealed");
    store.set_field("batteryCapacity", json!("200")).unwrap();

    let change_set = store.change_set(&GateState::Open).unwrap();
    assert_eq!(change_set.to_payload(), json!({"batteryCapacity": 200}));
}

#[test]
fn test_unknown_battery_type_is_rejected() {
    let mut store = profile_store("sealed");
    store.set_field("batteryType", json!("lithium")).unwrap();

    let err = store.change_set(&GateState::Open).unwrap_err();
    assert_eq!(ExError::from(err).kind(), ExErrorKind::InvalidEnumValue);
}

// ---------------------------------------------------------------------------
// Charging parameters
// ---------------------------------------------------------------------------

#[test]
fn test_numeric_string_equal_to_snapshot_is_excluded() {
    let mut store = params_store();
    store.set_field("equalizationCycle", json!("30")).unwrap();
    store.set_field("boostVoltage", json!("14.40")).unwrap();

    let change_set = store.change_set(&GateState::Open).unwrap();
    assert!(change_set.is_empty());
    assert!(store.is_dirty());
}

#[test]
fn test_unparsable_value_fails_whole_change_set() {
    let mut store = params_store();
    store.set_field("boostVoltage", json!("14.5")).unwrap();
    store.set_field("equalizationCycle", json!("thirty")).unwrap();

    let err = store.change_set(&GateState::Open).unwrap_err();
    match err {
        ReconcileError::InvalidFieldValue { field, .. } => assert_eq!(field, "equalizationCycle"),
        other => panic!("expected InvalidFieldValue, got {:?}", other),
    }
}

#[test]
fn test_first_malformed_field_in_schema_order_is_reported() {
    let mut store = params_store();
    store.set_field("floatVoltage", json!("x")).unwrap();
    store.set_field("boostVoltage", json!("y")).unwrap();

    let err = store.change_set(&GateState::Open).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::InvalidFieldValue { ref field, .. } if field == "boostVoltage"
    ));
}

#[test]
fn test_closed_gate_withholds_gated_fields() {
    let profile = profile_store("sealed");
    let gate = CHARGING_GATE.evaluate_store(&profile);

    let mut store = params_store();
    store.set_field("boostVoltage", json!(14.5)).unwrap();

    let err = store.change_set(&gate).unwrap_err();
    match err {
        ReconcileError::EditGateClosed {
            reason, withheld, ..
        } => {
            assert_eq!(withheld, ["boostVoltage"]);
            assert_eq!(
                reason,
                "Set Battery Type to 'User Defined' and save to edit charging parameters"
            );
        }
        other => panic!("expected EditGateClosed, got {:?}", other),
    }
}

#[test]
fn test_closed_gate_skips_coercion_of_gated_fields() {
    let profile = profile_store("gel");
    let gate = CHARGING_GATE.evaluate_store(&profile);

    let mut store = params_store();
    store.set_field("boostVoltage", json!("garbage")).unwrap();

    let err = store.change_set(&gate).unwrap_err();
    assert!(matches!(err, ReconcileError::EditGateClosed { .. }));
}

#[test]
fn test_open_gate_includes_gated_fields() {
    let profile = profile_store("userDefined");
    let gate = CHARGING_GATE.evaluate_store(&profile);
    assert!(gate.is_open());

    let mut store = params_store();
    store.set_field("boostVoltage", json!("14.5")).unwrap();
    store.set_field("equalizationCycle", json!(28)).unwrap();

    let change_set = store.change_set(&gate).unwrap();
    assert_eq!(
        change_set.to_payload(),
        json!({"boostVoltage": 14.5, "equalizationCycle": 28})
    );
}

#[test]
fn test_voltage_chain_checked_on_proposed_state() {
    let mut store = params_store();
    // float above boost breaks the charging chain
    store.set_field("floatVoltage", json!("14.5")).unwrap();

    let err = store.change_set(&GateState::Open).unwrap_err();
    match err {
        ReconcileError::ConstraintViolation { rule, detail, .. } => {
            assert_eq!(rule, "charging voltage chain");
            assert!(detail.contains("boost (14.40) > float (14.50)"), "{}", detail);
        }
        other => panic!("expected ConstraintViolation, got {:?}", other),
    }
}

#[test]
fn test_low_voltage_pair() {
    let mut store = params_store();
    store.set_field("lowVoltReconnectVoltage", json!(11.0)).unwrap();

    let err = store.change_set(&GateState::Open).unwrap_err();
    assert!(matches!(
        err,
        ReconcileError::ConstraintViolation { ref rule, .. } if rule == "low voltage pair"
    ));
}

#[test]
fn test_commit_then_recompute_is_empty() {
    let mut store = params_store();
    store.set_field("boostVoltage", json!("14.5")).unwrap();
    let change_set = store.change_set(&GateState::Open).unwrap();

    let mut confirmed = store.snapshot().unwrap().to_value();
    for (k, v) in &change_set.changes {
        confirmed[k.as_str()] = v.clone();
    }
    store.commit(confirmed).unwrap();

    assert!(store.change_set(&GateState::Open).unwrap().is_empty());
}

#[test]
fn test_extra_payload_fields_are_never_diffed() {
    let mut store = params_store();
    let mut raw = store.snapshot().unwrap().to_value();
    raw["firmware"] = json!("v1.2");
    store.load_from(raw).unwrap();

    assert!(store.set_field("firmware", json!("v2")).is_err());
    assert!(store.change_set(&GateState::Open).unwrap().is_empty());
}
