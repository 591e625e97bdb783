//! Advisory Engine Implementation

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One set of soil test measurements
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurements {
    /// Nitrogen level (mg/kg)
    pub nitrogen: f64,
    /// Phosphorus level (mg/kg)
    pub phosphorus: f64,
    /// Potassium level (mg/kg)
    pub potassium: f64,
    /// pH level (0-14 nominal)
    pub ph: f64,
    /// Moisture content (%)
    pub moisture: f64,
}

/// Measured attribute an advisory refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Nitrogen,
    Phosphorus,
    Ph,
    Moisture,
}

impl Attribute {
    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Nitrogen => "nitrogen",
            Attribute::Phosphorus => "phosphorus",
            Attribute::Ph => "ph",
            Attribute::Moisture => "moisture",
        }
    }
}

/// Which side of the nominal band a reading fell on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

/// Nominal band for one attribute. Both bounds are exclusive triggers:
/// a reading equal to `low` or `high` is in band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub low: f64,
    pub high: f64,
}

impl Band {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// Classify a reading. NaN is never out of band.
    pub fn classify(&self, value: f64) -> Option<Level> {
        if value < self.low {
            Some(Level::Low)
        } else if value > self.high {
            Some(Level::High)
        } else {
            None
        }
    }
}

/// Advisory thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisoryConfig {
    /// Nitrogen band (mg/kg)
    pub nitrogen: Band,
    /// Phosphorus band (mg/kg)
    pub phosphorus: Band,
    /// pH band
    pub ph: Band,
    /// Moisture band (%)
    pub moisture: Band,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            nitrogen: Band::new(1.0, 4.0),
            phosphorus: Band::new(1.0, 4.0),
            ph: Band::new(6.0, 7.5),
            moisture: Band::new(20.0, 40.0),
        }
    }
}

/// A single recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub attribute: Attribute,
    pub level: Level,
    pub message: String,
}

impl Advisory {
    fn new(attribute: Attribute, level: Level) -> Self {
        Self {
            attribute,
            level,
            message: message_for(attribute, level).to_string(),
        }
    }
}

fn message_for(attribute: Attribute, level: Level) -> &'static str {
    match (attribute, level) {
        (Attribute::Nitrogen, Level::Low) => {
            "Nitrogen: Low levels detected. Consider adding nitrogen-rich fertilizers or planting legumes."
        }
        (Attribute::Nitrogen, Level::High) => {
            "Nitrogen: High levels detected. Reduce nitrogen fertilization."
        }
        (Attribute::Phosphorus, Level::Low) => {
            "Phosphorus: Low levels detected. Apply phosphate fertilizers or organic matter."
        }
        (Attribute::Phosphorus, Level::High) => {
            "Phosphorus: High levels detected. Avoid phosphorus-rich fertilizers."
        }
        (Attribute::Ph, Level::Low) => {
            "pH Level: Acidic soil detected. Consider adding lime to raise pH."
        }
        (Attribute::Ph, Level::High) => {
            "pH Level: Alkaline soil detected. Consider adding sulfur to lower pH."
        }
        (Attribute::Moisture, Level::Low) => {
            "Moisture: Low content detected. Improve irrigation and add organic matter."
        }
        (Attribute::Moisture, Level::High) => {
            "Moisture: High content detected. Improve drainage system."
        }
    }
}

/// Stateless rule evaluator
#[derive(Debug, Clone, Default)]
pub struct AdvisoryEngine {
    config: AdvisoryConfig,
}

impl AdvisoryEngine {
    /// Create an engine with the given thresholds
    pub fn new(config: AdvisoryConfig) -> Self {
        Self { config }
    }

    /// Evaluate every rule against the measurements.
    ///
    /// Output order is nitrogen, phosphorus, pH, moisture. Potassium has no
    /// rule and never contributes.
    pub fn recommend(&self, m: &Measurements) -> Vec<Advisory> {
        let checks = [
            (Attribute::Nitrogen, m.nitrogen, &self.config.nitrogen),
            (Attribute::Phosphorus, m.phosphorus, &self.config.phosphorus),
            (Attribute::Ph, m.ph, &self.config.ph),
            (Attribute::Moisture, m.moisture, &self.config.moisture),
        ];

        let advisories: Vec<Advisory> = checks
            .iter()
            .filter_map(|(attribute, value, band)| {
                band.classify(*value)
                    .map(|level| Advisory::new(*attribute, level))
            })
            .collect();

        debug!("{} advisories for {:?}", advisories.len(), m);
        advisories
    }
}

/// Advisory texts for one measurement set using the default thresholds
pub fn soil_recommendations(
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    ph: f64,
    moisture: f64,
) -> Vec<String> {
    let m = Measurements {
        nitrogen,
        phosphorus,
        potassium,
        ph,
        moisture,
    };
    AdvisoryEngine::default()
        .recommend(&m)
        .into_iter()
        .map(|a| a.message)
        .collect()
}
