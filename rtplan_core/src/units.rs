//! # Unit Types
//!
//! Thin newtype wrappers for the handful of units the translator moves
//! between. The planning system stores lengths in centimeters and doses in
//! centigray; the RT Plan document uses millimeters and gray.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::units::{Centimeters, Millimeters, CentiGray, Gray};
//!
//! let jaw = Centimeters(2.5);
//! let jaw_mm: Millimeters = jaw.into();
//! assert_eq!(jaw_mm.0, 25.0);
//!
//! let dose: Gray = CentiGray(200.0).into();
//! assert_eq!(dose.0, 2.0);
//! ```

use serde::{Deserialize, Serialize};

// ============================================================================
// Length Units
// ============================================================================

/// Length in centimeters (planning-system native)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Centimeters(pub f64);

/// Length in millimeters (RT Plan native)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Millimeters(pub f64);

impl From<Centimeters> for Millimeters {
    fn from(cm: Centimeters) -> Self {
        Millimeters(cm.0 * 10.0)
    }
}

// ============================================================================
// Dose Units
// ============================================================================

/// Dose in centigray
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CentiGray(pub f64);

/// Dose in gray
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gray(pub f64);

impl From<CentiGray> for Gray {
    fn from(cgy: CentiGray) -> Self {
        Gray(cgy.0 / 100.0)
    }
}

/// Convert a planning-system length (cm) straight to a raw millimeter value.
pub fn cm_to_mm(cm: f64) -> f64 {
    Millimeters::from(Centimeters(cm)).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cm_to_mm() {
        let cm = Centimeters(2.0);
        let mm: Millimeters = cm.into();
        assert_eq!(mm.0, 20.0);
        assert_eq!(cm_to_mm(-1.5), -15.0);
    }

    #[test]
    fn test_centigray_to_gray() {
        let cgy = CentiGray(180.0);
        let gy: Gray = cgy.into();
        assert!((gy.0 - 1.8).abs() < 1e-12);
        assert_eq!(Gray::from(CentiGray(0.0)), Gray(0.0));
    }

    #[test]
    fn test_serialization() {
        let cm = Centimeters(12.5);
        let json = serde_json::to_string(&cm).unwrap();
        assert_eq!(json, "12.5");

        let roundtrip: Centimeters = serde_json::from_str(&json).unwrap();
        assert_eq!(cm, roundtrip);
    }
}
