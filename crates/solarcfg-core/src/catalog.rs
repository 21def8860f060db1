//! Configuration resources exposed by the charge controller API.

use crate::gate::EditGate;
use crate::schema::{ChainRule, FieldDescriptor, ResourceSchema};
use serde::{Deserialize, Serialize};

pub const BATTERY_TYPES: &[&str] = &["sealed", "gel", "flooded", "userDefined"];

/// Battery type under which charging parameters become writable
pub const USER_DEFINED: &str = "userDefined";

/// Device registers are u16
const REGISTER_MAX: i64 = u16::MAX as i64;

pub static BATTERY_PROFILE: ResourceSchema = ResourceSchema {
    name: "battery-profile",
    label: "battery profile",
    fields: &[
        FieldDescriptor::enumeration("batteryType", BATTERY_TYPES),
        FieldDescriptor::int_range("batteryCapacity", 0, REGISTER_MAX),
    ],
    rules: &[],
};

pub static CHARGING_PARAMETERS: ResourceSchema = ResourceSchema {
    name: "charging-parameters",
    label: "charging parameters",
    fields: &[
        FieldDescriptor::float("chargingLimitVoltage").gated(),
        FieldDescriptor::float("boostVoltage").gated(),
        FieldDescriptor::float("boostReconnectChargingVoltage").gated(),
        FieldDescriptor::int_range("boostDuration", 0, REGISTER_MAX).gated(),
        FieldDescriptor::float("floatVoltage").gated(),
        FieldDescriptor::float("equalizationVoltage").gated(),
        FieldDescriptor::int_range("equalizationCycle", 0, REGISTER_MAX).gated(),
        FieldDescriptor::int_range("equalizationDuration", 0, REGISTER_MAX).gated(),
        FieldDescriptor::float("overVoltDisconnectVoltage").gated(),
        FieldDescriptor::float("overVoltReconnectVoltage").gated(),
        FieldDescriptor::float("lowVoltDisconnectVoltage").gated(),
        FieldDescriptor::float("lowVoltReconnectVoltage").gated(),
        FieldDescriptor::float("underVoltWarningVoltage").gated(),
        FieldDescriptor::float("underVoltWarningReconnectVoltage").gated(),
        FieldDescriptor::float("dischargingLimitVoltage").gated(),
        FieldDescriptor::float("batteryTempUpperLimit").gated(),
        FieldDescriptor::float("batteryTempLowerLimit").gated(),
        FieldDescriptor::float("controllerTempUpperLimit").gated(),
        FieldDescriptor::float("controllerTempLowerLimit").gated(),
    ],
    rules: &[
        ChainRule {
            name: "charging voltage chain",
            links: &[
                ("overVoltDisconnectVoltage", "overVoltDisconnect"),
                ("chargingLimitVoltage", "chargingLimit"),
                ("equalizationVoltage", "equalization"),
                ("boostVoltage", "boost"),
                ("floatVoltage", "float"),
                ("boostReconnectChargingVoltage", "boostReconnect"),
            ],
        },
        ChainRule {
            name: "discharging voltage chain",
            links: &[
                ("underVoltWarningReconnectVoltage", "underVoltReconnect"),
                ("underVoltWarningVoltage", "underVoltWarning"),
                ("lowVoltDisconnectVoltage", "lowVoltDisconnect"),
                ("dischargingLimitVoltage", "dischargingLimit"),
            ],
        },
        ChainRule {
            name: "over voltage pair",
            links: &[
                ("overVoltDisconnectVoltage", "overVoltDisconnect"),
                ("overVoltReconnectVoltage", "overVoltReconnect"),
            ],
        },
        ChainRule {
            name: "low voltage pair",
            links: &[
                ("lowVoltReconnectVoltage", "lowVoltReconnect"),
                ("lowVoltDisconnectVoltage", "lowVoltDisconnect"),
            ],
        },
    ],
};

/// Charging parameters unlock once a userDefined battery profile is confirmed
pub static CHARGING_GATE: EditGate = EditGate {
    source: ResourceId::BatteryProfile,
    target: ResourceId::ChargingParameters,
    variant_field: "batteryType",
    variant_field_label: "Battery Type",
    required_variant: USER_DEFINED,
    required_variant_label: "User Defined",
};

/// Identifier of a configuration resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceId {
    BatteryProfile,
    ChargingParameters,
}

impl ResourceId {
    pub const ALL: [ResourceId; 2] = [ResourceId::BatteryProfile, ResourceId::ChargingParameters];

    pub fn schema(self) -> &'static ResourceSchema {
        match self {
            ResourceId::BatteryProfile => &BATTERY_PROFILE,
            ResourceId::ChargingParameters => &CHARGING_PARAMETERS,
        }
    }

    /// Edit-gate guarding this resource's fields, if any
    pub fn gate(self) -> Option<&'static EditGate> {
        match self {
            ResourceId::BatteryProfile => None,
            ResourceId::ChargingParameters => Some(&CHARGING_GATE),
        }
    }

    /// Gates whose source is this resource (saving it may cascade)
    pub fn dependents(self) -> impl Iterator<Item = &'static EditGate> {
        ResourceId::ALL
            .into_iter()
            .filter_map(ResourceId::gate)
            .filter(move |gate| gate.source == self)
    }

    /// Path of this resource under `prefix`, e.g. `/api/solar/battery-profile`
    pub fn path(self, prefix: &str) -> String {
        format!("{}/{}", prefix.trim_end_matches('/'), self.schema().name)
    }

    pub fn label(self) -> &'static str {
        self.schema().label
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.schema().name)
    }
}

impl std::str::FromStr for ResourceId {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ResourceId::ALL
            .into_iter()
            .find(|id| id.schema().name == s)
            .ok_or_else(|| {
                format!(
                    "unknown resource '{}' (expected one of: battery-profile, charging-parameters)",
                    s
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            ResourceId::BatteryProfile.path("/api/solar"),
            "/api/solar/battery-profile"
        );
        assert_eq!(
            ResourceId::ChargingParameters.path("/api/solar/"),
            "/api/solar/charging-parameters"
        );
    }

    #[test]
    fn test_from_str_round_trips_display() {
        for id in ResourceId::ALL {
            assert_eq!(id.to_string().parse::<ResourceId>(), Ok(id));
        }
        assert!("time".parse::<ResourceId>().is_err());
    }

    #[test]
    fn test_charging_fields_are_all_gated() {
        assert!(CHARGING_PARAMETERS.fields.iter().all(|f| f.gated));
        assert!(BATTERY_PROFILE.fields.iter().all(|f| !f.gated));
    }

    #[test]
    fn test_rule_fields_exist_in_schema() {
        for rule in CHARGING_PARAMETERS.rules {
            for (field, _) in rule.links {
                assert!(CHARGING_PARAMETERS.field(field).is_some(), "{}", field);
            }
        }
    }

    #[test]
    fn test_battery_profile_cascades_to_charging_parameters() {
        let targets: Vec<_> = ResourceId::BatteryProfile
            .dependents()
            .map(|g| g.target)
            .collect();
        assert_eq!(targets, [ResourceId::ChargingParameters]);
        assert_eq!(ResourceId::ChargingParameters.dependents().count(), 0);
    }
}
