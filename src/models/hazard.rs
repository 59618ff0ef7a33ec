use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The closed set of hazard categories an alert can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HazardKind {
    Earthquake,
    Flood,
    Tornado,
    Fire,
    Storm,
}

/// Effect radius applied when the reporter does not supply one, in meters.
const FALLBACK_RADIUS_M: i32 = 10_000;

/// Lifetime applied to alerts with no recognized hazard kind.
const FALLBACK_LIFETIME_DAYS: i64 = 1;

impl HazardKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "earthquake" => Some(Self::Earthquake),
            "flood" => Some(Self::Flood),
            "tornado" => Some(Self::Tornado),
            "fire" => Some(Self::Fire),
            "storm" => Some(Self::Storm),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Earthquake => "earthquake",
            Self::Flood => "flood",
            Self::Tornado => "tornado",
            Self::Fire => "fire",
            Self::Storm => "storm",
        }
    }

    /// Default effect radius in meters for this hazard kind.
    pub fn default_radius_m(self) -> i32 {
        match self {
            Self::Earthquake => 50_000,
            Self::Flood => 10_000,
            Self::Tornado => 5_000,
            Self::Fire => 5_000,
            Self::Storm => 50_000,
        }
    }

    /// How long an alert of this kind stays active before the sweep
    /// archives it.
    pub fn default_lifetime(self) -> chrono::Duration {
        match self {
            Self::Earthquake => chrono::Duration::days(2),
            Self::Flood => chrono::Duration::days(10),
            Self::Tornado => chrono::Duration::days(3),
            Self::Fire => chrono::Duration::days(7),
            Self::Storm => chrono::Duration::days(5),
        }
    }
}

/// Registry lookup tolerating alerts without a hazard kind.
pub fn default_radius_m(kind: Option<HazardKind>) -> i32 {
    kind.map(HazardKind::default_radius_m)
        .unwrap_or(FALLBACK_RADIUS_M)
}

pub fn default_lifetime(kind: Option<HazardKind>) -> chrono::Duration {
    kind.map(HazardKind::default_lifetime)
        .unwrap_or_else(|| chrono::Duration::days(FALLBACK_LIFETIME_DAYS))
}

/// Expiry timestamp for an alert created (or re-kinded) at `now`.
pub fn expiry_from(now: chrono::NaiveDateTime, kind: Option<HazardKind>) -> chrono::NaiveDateTime {
    now + default_lifetime(kind)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FloodSeverity {
    Low,
    Moderate,
    Major,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum TornadoCategory {
    EF0,
    EF1,
    EF2,
    EF3,
    EF4,
    EF5,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FireIntensity {
    Low,
    Moderate,
    High,
}

/// Kind-specific attributes attached to an alert. Every field is optional;
/// reporters rarely know all of them at submission time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HazardDetails {
    Earthquake {
        magnitude: Option<f64>,
        depth: Option<f64>,
        epicenter_description: Option<String>,
    },
    Flood {
        severity: Option<FloodSeverity>,
        water_level: Option<f64>,
        is_flash_flood: Option<bool>,
    },
    Tornado {
        category: Option<TornadoCategory>,
        damage_description: Option<String>,
    },
    Fire {
        fire_intensity: Option<FireIntensity>,
        is_contained: Option<bool>,
        cause: Option<String>,
    },
    Storm {
        wind_speed: Option<f64>,
        rainfall: Option<f64>,
        storm_category: Option<i32>,
    },
}

impl HazardDetails {
    pub fn kind(&self) -> HazardKind {
        match self {
            Self::Earthquake { .. } => HazardKind::Earthquake,
            Self::Flood { .. } => HazardKind::Flood,
            Self::Tornado { .. } => HazardKind::Tornado,
            Self::Fire { .. } => HazardKind::Fire,
            Self::Storm { .. } => HazardKind::Storm,
        }
    }

    /// Build details for `kind` from a loose attribute map submitted by a
    /// client. Empty-string values are treated as absent, and attribute
    /// values that do not fit the kind's schema fail validation.
    pub fn from_attributes(kind: HazardKind, attributes: serde_json::Value) -> AppResult<Self> {
        let mut map = match attributes {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => serde_json::Map::new(),
            other => {
                return Err(AppError::Validation(format!(
                    "Hazard details must be an object, got {other}"
                )))
            }
        };

        for value in map.values_mut() {
            if matches!(value, serde_json::Value::String(s) if s.trim().is_empty()) {
                *value = serde_json::Value::Null;
            }
        }

        map.insert(
            "kind".to_string(),
            serde_json::Value::String(kind.as_str().to_string()),
        );

        serde_json::from_value(serde_json::Value::Object(map))
            .map_err(|e| AppError::Validation(format!("Invalid hazard details: {e}")))
    }
}
