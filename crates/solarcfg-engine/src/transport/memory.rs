//! In-memory stand-in for the controller's configuration API.
//!
//! Serves both resources with PATCH semantics (partial update, then
//! read-back) and enforces the controller's own write rules, so the screen
//! can be driven end to end without hardware. Failures can be scripted per
//! path and every request is recorded.

use super::Transport;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use solarcfg_core::catalog::{CHARGING_GATE, USER_DEFINED};
use solarcfg_core::schema::check_rules;
use solarcfg_core::{ChangeSet, ResourceId, TransportError};
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Scripted failure for a path
#[derive(Debug, Clone, PartialEq)]
pub enum Fault {
    /// Answer with a failure status and an optional `{"error": ...}` body
    Http {
        status: u16,
        status_text: String,
        error: Option<String>,
    },
    /// No response at all
    Network(String),
}

impl Fault {
    pub fn http(status: u16, status_text: impl Into<String>) -> Self {
        Fault::Http {
            status,
            status_text: status_text.into(),
            error: None,
        }
    }

    /// Attach a structured body error to an HTTP fault
    pub fn with_error(self, message: impl Into<String>) -> Self {
        match self {
            Fault::Http {
                status,
                status_text,
                ..
            } => Fault::Http {
                status,
                status_text,
                error: Some(message.into()),
            },
            other => other,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Fault::Network(message.into())
    }

    fn to_error(&self) -> TransportError {
        match self {
            Fault::Http {
                status,
                status_text,
                error,
            } => {
                let err = TransportError::http(*status, status_text.clone());
                match error {
                    Some(message) => err.with_server_message(message.clone()),
                    None => err,
                }
            }
            Fault::Network(message) => TransportError::network(message.clone()),
        }
    }
}

/// A request as received by the simulated controller
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    /// PATCH body
    pub body: Option<Value>,
}

#[derive(Debug, Default)]
struct Faults {
    once: HashMap<String, VecDeque<Fault>>,
    always: HashMap<String, Fault>,
}

impl Faults {
    fn take(&mut self, path: &str) -> Option<Fault> {
        if let Some(fault) = self.once.get_mut(path).and_then(VecDeque::pop_front) {
            return Some(fault);
        }
        self.always.get(path).cloned()
    }
}

#[derive(Debug)]
struct Device {
    battery_profile: Map<String, Value>,
    charging_parameters: Map<String, Value>,
}

impl Device {
    fn record(&self, resource: ResourceId) -> &Map<String, Value> {
        match resource {
            ResourceId::BatteryProfile => &self.battery_profile,
            ResourceId::ChargingParameters => &self.charging_parameters,
        }
    }

    fn record_mut(&mut self, resource: ResourceId) -> &mut Map<String, Value> {
        match resource {
            ResourceId::BatteryProfile => &mut self.battery_profile,
            ResourceId::ChargingParameters => &mut self.charging_parameters,
        }
    }

    fn battery_type(&self) -> Option<&str> {
        self.battery_profile
            .get(CHARGING_GATE.variant_field)
            .and_then(Value::as_str)
    }

    /// Apply a partial update and return the read-back
    fn patch(&mut self, resource: ResourceId, body: &Value) -> Result<Value, Fault> {
        let Some(body) = body.as_object() else {
            return Err(bad_request("request body must be a JSON object"));
        };
        if resource == ResourceId::ChargingParameters && self.battery_type() != Some(USER_DEFINED) {
            return Err(bad_request(
                "Charging parameters can only be modified when battery type is 'userDefined'",
            ));
        }

        let schema = resource.schema();
        let mut proposed = self.record(resource).clone();
        for (name, raw) in body {
            // Unknown keys are ignored, as the controller does
            let Some(descriptor) = schema.field(name) else {
                continue;
            };
            let typed = solarcfg_core::schema::coerce(descriptor, raw)
                .map_err(|e| bad_request(&e.to_string()))?;
            proposed.insert(name.clone(), typed.to_json());
        }
        check_rules(schema, &proposed).map_err(|e| bad_request(&e.to_string()))?;

        *self.record_mut(resource) = proposed;
        Ok(Value::Object(self.record(resource).clone()))
    }
}

fn bad_request(message: &str) -> Fault {
    Fault::http(400, "Bad Request").with_error(message)
}

/// Simulated controller
#[derive(Debug)]
pub struct MemoryTransport {
    prefix: String,
    device: Mutex<Device>,
    faults: Mutex<Faults>,
    requests: Mutex<Vec<RecordedRequest>>,
    latency: Mutex<Option<Duration>>,
}

impl MemoryTransport {
    /// Controller with a sealed battery and factory charging parameters
    pub fn new(prefix: &str) -> Self {
        Self::with_state(prefix, default_battery_profile(), default_charging_parameters())
    }

    /// Controller seeded with the given records; non-object seeds are
    /// replaced by empty records.
    pub fn with_state(prefix: &str, battery_profile: Value, charging_parameters: Value) -> Self {
        let as_record = |value: Value| match value {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            device: Mutex::new(Device {
                battery_profile: as_record(battery_profile),
                charging_parameters: as_record(charging_parameters),
            }),
            faults: Mutex::new(Faults::default()),
            requests: Mutex::new(Vec::new()),
            latency: Mutex::new(None),
        }
    }

    pub fn path(&self, resource: ResourceId) -> String {
        resource.path(&self.prefix)
    }

    /// Fail the next request to `resource` with `fault`
    pub fn fail_next(&self, resource: ResourceId, fault: Fault) {
        let path = self.path(resource);
        lock(&self.faults).once.entry(path).or_default().push_back(fault);
    }

    /// Fail every request to `resource` until [`clear_faults`](Self::clear_faults)
    pub fn fail_always(&self, resource: ResourceId, fault: Fault) {
        let path = self.path(resource);
        lock(&self.faults).always.insert(path, fault);
    }

    pub fn clear_faults(&self) {
        *lock(&self.faults) = Faults::default();
    }

    /// Delay every response by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = Some(latency);
    }

    /// Current device state of `resource`
    pub fn state(&self, resource: ResourceId) -> Value {
        Value::Object(lock(&self.device).record(resource).clone())
    }

    /// Overwrite device state behind the client's back
    pub fn set_state(&self, resource: ResourceId, record: Value) {
        if let Value::Object(map) = record {
            *lock(&self.device).record_mut(resource) = map;
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Paths requested so far, prefixed with the method
    pub fn request_log(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn clear_requests(&self) {
        lock(&self.requests).clear();
    }

    fn resolve(&self, path: &str) -> Result<ResourceId, TransportError> {
        ResourceId::ALL
            .into_iter()
            .find(|id| self.path(*id) == path)
            .ok_or_else(|| TransportError::http(404, "Not Found").with_server_message("not found"))
    }

    async fn respond(&self, method: &'static str, path: &str, body: Option<Value>) -> Result<Value, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            method,
            path: path.to_string(),
            body: body.clone(),
        });

        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if let Some(fault) = lock(&self.faults).take(path) {
            return Err(fault.to_error());
        }
        let resource = self.resolve(path)?;
        let mut device = lock(&self.device);
        match body {
            None => Ok(Value::Object(device.record(resource).clone())),
            Some(body) => device.patch(resource, &body).map_err(|f| f.to_error()),
        }
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn fetch(&self, path: &str) -> Result<Value, TransportError> {
        self.respond("GET", path, None).await
    }

    async fn submit(&self, path: &str, change_set: &ChangeSet) -> Result<Value, TransportError> {
        self.respond("PATCH", path, Some(change_set.to_payload())).await
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn default_battery_profile() -> Value {
    json!({"batteryType": "sealed", "batteryCapacity": 100})
}

pub fn default_charging_parameters() -> Value {
    json!({
        "chargingLimitVoltage": 15.0,
        "boostVoltage": 14.4,
        "boostReconnectChargingVoltage": 13.2,
        "boostDuration": 120,
        "floatVoltage": 13.8,
        "equalizationVoltage": 14.6,
        "equalizationCycle": 30,
        "equalizationDuration": 120,
        "overVoltDisconnectVoltage": 16.0,
        "overVoltReconnectVoltage": 15.0,
        "lowVoltDisconnectVoltage": 11.1,
        "lowVoltReconnectVoltage": 12.6,
        "underVoltWarningVoltage": 12.0,
        "underVoltWarningReconnectVoltage": 12.2,
        "dischargingLimitVoltage": 10.6,
        "batteryTempUpperLimit": 65.0,
        "batteryTempLowerLimit": -40.0,
        "controllerTempUpperLimit": 85.0,
        "controllerTempLowerLimit": -40.0
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREFIX: &str = "/api/solar";

    fn change_set(resource: ResourceId, changes: Value) -> ChangeSet {
        ChangeSet {
            resource: resource.to_string(),
            changes: changes.as_object().cloned().unwrap(),
            withheld: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_patch_is_partial_and_reads_back() {
        let device = MemoryTransport::new(PREFIX);
        let path = device.path(ResourceId::BatteryProfile);

        let result = device
            .submit(&path, &change_set(ResourceId::BatteryProfile, json!({"batteryCapacity": 200})))
            .await
            .unwrap();
        assert_eq!(result, json!({"batteryType": "sealed", "batteryCapacity": 200}));
    }

    #[tokio::test]
    async fn test_charging_parameters_locked_unless_user_defined() {
        let device = MemoryTransport::new(PREFIX);
        let path = device.path(ResourceId::ChargingParameters);

        let err = device
            .submit(&path, &change_set(ResourceId::ChargingParameters, json!({"boostVoltage": 14.5})))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(
            err.server_message(),
            Some("Charging parameters can only be modified when battery type is 'userDefined'")
        );
    }

    #[tokio::test]
    async fn test_voltage_rules_are_enforced() {
        let device = MemoryTransport::new(PREFIX);
        device.set_state(ResourceId::BatteryProfile, json!({"batteryType": "userDefined", "batteryCapacity": 100}));
        let path = device.path(ResourceId::ChargingParameters);

        let err = device
            .submit(&path, &change_set(ResourceId::ChargingParameters, json!({"floatVoltage": 14.5})))
            .await
            .unwrap_err();
        assert!(err
            .server_message()
            .is_some_and(|m| m.starts_with("charging voltage chain violated")));
        assert_eq!(
            device.state(ResourceId::ChargingParameters)["floatVoltage"],
            json!(13.8)
        );
    }

    #[tokio::test]
    async fn test_fail_next_is_consumed_once() {
        let device = MemoryTransport::new(PREFIX);
        device.fail_next(ResourceId::BatteryProfile, Fault::network("connection refused"));
        let path = device.path(ResourceId::BatteryProfile);

        assert!(device.fetch(&path).await.unwrap_err().is_network());
        assert!(device.fetch(&path).await.is_ok());
        assert_eq!(device.request_log(), ["GET /api/solar/battery-profile"; 2]);
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let device = MemoryTransport::new(PREFIX);
        let err = device.fetch("/api/solar/time").await.unwrap_err();
        assert_eq!(err.status(), Some(404));
    }
}
