//! Reef water-parameter catalogue.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ------------------------------------------------------------------ //
//  Keys                                                               //
// ------------------------------------------------------------------ //

/// One of the water parameters a reading can carry.
///
/// Declaration order is the display order used everywhere a reading is
/// rendered or evaluated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKey {
    Temperature,
    Alkalinity,
    Ph,
    Calcium,
    Magnesium,
    Phosphate,
    Nitrate,
    Salinity,
}

impl ParameterKey {
    pub const ALL: [ParameterKey; 8] = [
        ParameterKey::Temperature,
        ParameterKey::Alkalinity,
        ParameterKey::Ph,
        ParameterKey::Calcium,
        ParameterKey::Magnesium,
        ParameterKey::Phosphate,
        ParameterKey::Nitrate,
        ParameterKey::Salinity,
    ];

    /// Wire / storage identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            ParameterKey::Temperature => "temperature",
            ParameterKey::Alkalinity  => "alkalinity",
            ParameterKey::Ph          => "ph",
            ParameterKey::Calcium     => "calcium",
            ParameterKey::Magnesium   => "magnesium",
            ParameterKey::Phosphate   => "phosphate",
            ParameterKey::Nitrate     => "nitrate",
            ParameterKey::Salinity    => "salinity",
        }
    }

    /// Human-readable name.
    pub fn label(self) -> &'static str {
        match self {
            ParameterKey::Temperature => "Temperature",
            ParameterKey::Alkalinity  => "Alkalinity",
            ParameterKey::Ph          => "pH",
            ParameterKey::Calcium     => "Calcium",
            ParameterKey::Magnesium   => "Magnesium",
            ParameterKey::Phosphate   => "Phosphate",
            ParameterKey::Nitrate     => "Nitrate",
            ParameterKey::Salinity    => "Salinity",
        }
    }

    /// Unit label, empty for dimensionless parameters (pH).
    pub fn unit(self) -> &'static str {
        match self {
            ParameterKey::Temperature => "°F",
            ParameterKey::Alkalinity  => "dKH",
            ParameterKey::Ph          => "",
            ParameterKey::Calcium
            | ParameterKey::Magnesium
            | ParameterKey::Phosphate
            | ParameterKey::Nitrate   => "ppm",
            ParameterKey::Salinity    => "ppt",
        }
    }
}

impl std::fmt::Display for ParameterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter '{0}'")]
pub struct UnknownParameter(pub String);

impl FromStr for ParameterKey {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParameterKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownParameter(s.to_string()))
    }
}

/// Validated numeric values of one reading, keyed by parameter.
///
/// Parameters left blank on entry are simply absent.
pub type ParameterValues = BTreeMap<ParameterKey, f64>;

// ------------------------------------------------------------------ //
//  Tests                                                              //
// ------------------------------------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_round_trips_through_its_identifier() {
        for key in ParameterKey::ALL {
            assert_eq!(key.as_str().parse::<ParameterKey>(), Ok(key));
        }
    }

    #[test]
    fn unknown_identifier_is_rejected() {
        assert_eq!(
            "ammonia".parse::<ParameterKey>(),
            Err(UnknownParameter("ammonia".into()))
        );
        assert!("Temperature".parse::<ParameterKey>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_identifiers() {
        let json = serde_json::to_string(&ParameterKey::Ph).unwrap();
        assert_eq!(json, "\"ph\"");

        let mut values = ParameterValues::new();
        values.insert(ParameterKey::Alkalinity, 8.3);
        let json = serde_json::to_value(&values).unwrap();
        assert_eq!(json, serde_json::json!({"alkalinity": 8.3}));
    }

    #[test]
    fn ph_is_dimensionless() {
        assert_eq!(ParameterKey::Ph.unit(), "");
        assert_eq!(ParameterKey::Ph.label(), "pH");
        assert_eq!(ParameterKey::Alkalinity.unit(), "dKH");
    }

    #[test]
    fn ordering_follows_declaration() {
        let mut keys = vec![ParameterKey::Salinity, ParameterKey::Temperature, ParameterKey::Ph];
        keys.sort();
        assert_eq!(
            keys,
            vec![ParameterKey::Temperature, ParameterKey::Ph, ParameterKey::Salinity]
        );
    }
}
