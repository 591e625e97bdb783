//! Data Validator for Soil Test Submissions

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Nominal ranges for soil readings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Nutrient level valid range (mg/kg)
    pub nutrient_range: (f64, f64),
    /// pH valid range
    pub ph_range: (f64, f64),
    /// Moisture valid range (%)
    pub moisture_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            nutrient_range: (0.0, f64::MAX),
            ph_range: (0.0, 14.0),
            moisture_range: (0.0, 100.0),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }
}

/// Validator for soil test submissions
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Reject empty or whitespace-only text
    pub fn validate_required(
        &self,
        field: &'static str,
        value: &str,
    ) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::MissingField(field))
        } else {
            Ok(())
        }
    }

    /// Reject NaN and infinities, which SQLite cannot store as REAL
    pub fn validate_finite(&self, field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::InvalidFormat(format!("{} is not a finite number", field)))
        }
    }

    /// Validate a single value against a range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        self.validate_finite(field, value)?;
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate a nutrient level (nitrogen, phosphorus, potassium)
    pub fn validate_nutrient(
        &self,
        field: &'static str,
        level: f64,
    ) -> Result<(), ValidationError> {
        self.validate_range(field, level, self.config.nutrient_range)
    }

    /// Validate pH
    pub fn validate_ph(&self, ph: f64) -> Result<(), ValidationError> {
        self.validate_range("ph_level", ph, self.config.ph_range)
    }

    /// Validate moisture content
    pub fn validate_moisture(&self, moisture: f64) -> Result<(), ValidationError> {
        self.validate_range("moisture_content", moisture, self.config.moisture_range)
    }

    /// Check all five readings against their nominal ranges.
    ///
    /// Findings are informational; callers decide whether to block on them.
    pub fn check_nominal(
        &self,
        nitrogen: f64,
        phosphorus: f64,
        potassium: f64,
        ph: f64,
        moisture: f64,
    ) -> ValidationResult {
        let checks = [
            self.validate_nutrient("nitrogen_level", nitrogen),
            self.validate_nutrient("phosphorus_level", phosphorus),
            self.validate_nutrient("potassium_level", potassium),
            self.validate_ph(ph),
            self.validate_moisture(moisture),
        ];
        let fields_checked = checks.len();
        let errors: Vec<_> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_required_field() {
        let validator = Validator::default();
        assert!(validator.validate_required("farm_location", "Springfield").is_ok());
        assert_eq!(
            validator.validate_required("farm_location", ""),
            Err(ValidationError::MissingField("farm_location"))
        );
        assert!(validator.validate_required("farm_location", "   ").is_err());
    }

    #[test]
    fn test_ph_range() {
        let validator = Validator::default();
        assert!(validator.validate_ph(0.0).is_ok());
        assert!(validator.validate_ph(7.0).is_ok());
        assert!(validator.validate_ph(14.0).is_ok());
        assert!(validator.validate_ph(-0.1).is_err());
        assert!(validator.validate_ph(14.5).is_err());
    }

    #[test]
    fn test_moisture_range() {
        let validator = Validator::default();
        assert!(validator.validate_moisture(35.0).is_ok());
        assert!(validator.validate_moisture(120.0).is_err());
    }

    #[test]
    fn test_non_finite_rejected() {
        let validator = Validator::default();
        assert!(matches!(
            validator.validate_nutrient("nitrogen_level", f64::NAN),
            Err(ValidationError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_finite() {
        let validator = Validator::default();
        assert!(validator.validate_finite("ph_level", -3.0).is_ok());
        assert!(validator.validate_finite("ph_level", f64::INFINITY).is_err());
        assert_eq!(
            validator.validate_finite("moisture_content", f64::NAN),
            Err(ValidationError::InvalidFormat(
                "moisture_content is not a finite number".to_string()
            ))
        );
    }

    #[test]
    fn test_check_nominal_collects_findings() {
        let validator = Validator::default();

        let ok = validator.check_nominal(2.0, 2.0, 2.0, 6.5, 30.0);
        assert!(ok.valid);
        assert_eq!(ok.fields_checked, 5);

        let bad = validator.check_nominal(-1.0, 2.0, 2.0, 15.0, 30.0);
        assert!(!bad.valid);
        assert_eq!(bad.errors.len(), 2);
        assert_eq!(bad.fields_checked, 5);
    }

    proptest! {
        #[test]
        fn prop_non_blank_location_accepted(s in "[A-Za-z][A-Za-z ]{0,30}") {
            prop_assert!(Validator::default().validate_required("farm_location", &s).is_ok());
        }
    }
}
