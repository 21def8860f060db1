use serde_json::{json, Value};
use solarcfg_core::CascadePolicy;
use solarcfg_engine::transport::memory::default_charging_parameters;
use solarcfg_engine::{ConfigScreen, MemoryTransport};
use std::sync::Arc;
use std::time::Duration;

pub const PREFIX: &str = "/api/solar";

#[allow(dead_code)]
pub const BATTERY_PROFILE_PATH: &str = "/api/solar/battery-profile";
#[allow(dead_code)]
pub const CHARGING_PARAMETERS_PATH: &str = "/api/solar/charging-parameters";

/// Simulated controller reporting the given battery type
#[allow(dead_code)]
pub fn device(battery_type: &str) -> Arc<MemoryTransport> {
    Arc::new(MemoryTransport::with_state(
        PREFIX,
        json!({"batteryType": battery_type, "batteryCapacity": 100}),
        default_charging_parameters(),
    ))
}

#[allow(dead_code)]
pub fn screen(device: &Arc<MemoryTransport>) -> ConfigScreen {
    screen_with_policy(device, CascadePolicy::OnGateChange)
}

#[allow(dead_code)]
pub fn screen_with_policy(device: &Arc<MemoryTransport>, policy: CascadePolicy) -> ConfigScreen {
    ConfigScreen::with_options(device.clone(), PREFIX, policy, Duration::from_secs(4))
}

/// Mounted screen over a fresh device, with the mount requests cleared
#[allow(dead_code)]
pub async fn mounted(battery_type: &str) -> (Arc<MemoryTransport>, ConfigScreen) {
    let device = device(battery_type);
    let screen = screen(&device);
    screen.mount().await.unwrap();
    device.clear_requests();
    (device, screen)
}

#[allow(dead_code)]
pub fn notification_text(screen: &ConfigScreen) -> Option<String> {
    screen.notification().map(|n| n.message)
}

#[allow(dead_code)]
pub fn working_value(screen: &ConfigScreen, resource: solarcfg_core::ResourceId, field: &str) -> Option<Value> {
    screen
        .view()
        .resource(resource)
        .and_then(|r| r.working.as_ref())
        .and_then(|w| w.get(field).cloned())
}

#[allow(dead_code)]
pub fn snapshot_value(screen: &ConfigScreen, resource: solarcfg_core::ResourceId, field: &str) -> Option<Value> {
    screen
        .view()
        .resource(resource)
        .and_then(|r| r.snapshot.as_ref())
        .and_then(|s| s.get(field).cloned())
}
