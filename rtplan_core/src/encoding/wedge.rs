//! # Wedge Classification
//!
//! Maps the planning system's wedge descriptor (name, orientation keyword,
//! angle) onto the RT Plan wedge attributes. Rules, first match wins:
//!
//! 1. Empty name or `"No Wedge"`: no wedge.
//! 2. Name contains `edw` (any case): enhanced dynamic wedge. Bottom-to-top
//!    is orientation 0 with an `IN` suffix, top-to-bottom is 180 with `OUT`.
//! 3. Name contains `UP`: standard (physical) wedge, named
//!    `W{angle}{R|L|OUT|IN}{nominal}` where the nominal code comes from the
//!    angle table 15→30, 30→30, 45→20, 60→15.
//! 4. Anything else is reported back as unclassified.
//!
//! The classifier has no side effects; callers decide how to report an
//! unclassified wedge.
//!
//! ## Example
//!
//! ```rust
//! use rtplan_core::encoding::wedge::{classify_wedge, WedgeClass};
//! use rtplan_core::source::WedgeContext;
//!
//! let wedge = WedgeContext {
//!     wedge_name: "EDW15".to_string(),
//!     orientation: "WedgeBottomToTop".to_string(),
//!     angle: 15.0,
//! };
//!
//! match classify_wedge(&wedge) {
//!     WedgeClass::Wedge(spec) => assert_eq!(spec.id, "EDW1515IN"),
//!     other => panic!("unexpected {:?}", other),
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::document::WedgeType;
use crate::source::WedgeContext;

/// Name the planning system uses for "no wedge inserted"
pub const NO_WEDGE_NAME: &str = "No Wedge";

/// Wedge orientation keywords used by the planning system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WedgeOrientation {
    RightToLeft,
    LeftToRight,
    TopToBottom,
    BottomToTop,
}

impl WedgeOrientation {
    /// Parse a keyword such as `"WedgeBottomToTop"`.
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword.trim() {
            "WedgeRightToLeft" => Some(WedgeOrientation::RightToLeft),
            "WedgeLeftToRight" => Some(WedgeOrientation::LeftToRight),
            "WedgeTopToBottom" => Some(WedgeOrientation::TopToBottom),
            "WedgeBottomToTop" => Some(WedgeOrientation::BottomToTop),
            _ => None,
        }
    }

    /// RT Plan wedge orientation in degrees
    pub fn degrees(self) -> f64 {
        match self {
            WedgeOrientation::RightToLeft => 90.0,
            WedgeOrientation::LeftToRight => 270.0,
            WedgeOrientation::TopToBottom => 180.0,
            WedgeOrientation::BottomToTop => 0.0,
        }
    }

    /// Direction token used in standard wedge ids
    fn standard_token(self) -> &'static str {
        match self {
            WedgeOrientation::RightToLeft => "R",
            WedgeOrientation::LeftToRight => "L",
            WedgeOrientation::TopToBottom => "OUT",
            WedgeOrientation::BottomToTop => "IN",
        }
    }
}

/// Standardized wedge attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WedgeSpec {
    pub wedge_type: WedgeType,
    pub id: String,
    pub angle: f64,
    pub orientation: WedgeOrientation,
}

impl WedgeSpec {
    /// Orientation code as written in the plan ("0", "90", "180", "270")
    pub fn orientation_code(&self) -> String {
        format_angle(self.orientation.degrees())
    }
}

/// Outcome of classifying a wedge descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WedgeClass {
    /// No wedge inserted
    NoWedge,
    /// A recognised wedge
    Wedge(WedgeSpec),
    /// A wedge name (or name/orientation/angle combination) the rules do not cover
    Unclassified { name: String },
}

impl WedgeClass {
    /// Number of wedges this classification contributes to a beam (0 or 1)
    pub fn count(&self) -> usize {
        match self {
            WedgeClass::Wedge(_) => 1,
            _ => 0,
        }
    }

    /// The recognised wedge, if any
    pub fn spec(&self) -> Option<&WedgeSpec> {
        match self {
            WedgeClass::Wedge(spec) => Some(spec),
            _ => None,
        }
    }
}

/// Classify a control point's wedge descriptor.
pub fn classify_wedge(wedge: &WedgeContext) -> WedgeClass {
    let name = wedge.wedge_name.as_str();

    if name.is_empty() || name == NO_WEDGE_NAME {
        return WedgeClass::NoWedge;
    }

    let orientation = WedgeOrientation::parse(&wedge.orientation);

    if name.to_lowercase().contains("edw") {
        return match orientation {
            Some(o @ (WedgeOrientation::BottomToTop | WedgeOrientation::TopToBottom)) => {
                let suffix = if o == WedgeOrientation::BottomToTop { "IN" } else { "OUT" };
                WedgeClass::Wedge(WedgeSpec {
                    wedge_type: WedgeType::Dynamic,
                    id: format!("{}{}{}", name.to_uppercase(), format_angle(wedge.angle), suffix),
                    angle: wedge.angle,
                    orientation: o,
                })
            }
            _ => unclassified(name),
        };
    }

    if name.contains("UP") {
        let (Some(o), Some(nominal)) = (orientation, standard_nominal_code(wedge.angle)) else {
            return unclassified(name);
        };
        let angle = wedge.angle.trunc();
        return WedgeClass::Wedge(WedgeSpec {
            wedge_type: WedgeType::Standard,
            id: format!("W{}{}{}", angle as i64, o.standard_token(), nominal),
            angle,
            orientation: o,
        });
    }

    unclassified(name)
}

fn unclassified(name: &str) -> WedgeClass {
    WedgeClass::Unclassified {
        name: name.to_string(),
    }
}

/// Nominal code embedded in standard wedge ids, keyed by the (truncated) angle.
fn standard_nominal_code(angle: f64) -> Option<u32> {
    match angle.trunc() as i64 {
        15 => Some(30),
        30 => Some(30),
        45 => Some(20),
        60 => Some(15),
        _ => None,
    }
}

/// Render an angle without a trailing `.0` when it is whole.
pub(crate) fn format_angle(angle: f64) -> String {
    if angle.fract() == 0.0 {
        format!("{}", angle as i64)
    } else {
        format!("{}", angle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wedge(name: &str, orientation: &str, angle: f64) -> WedgeContext {
        WedgeContext {
            wedge_name: name.to_string(),
            orientation: orientation.to_string(),
            angle,
        }
    }

    fn spec_of(class: WedgeClass) -> WedgeSpec {
        match class {
            WedgeClass::Wedge(spec) => spec,
            other => panic!("expected a wedge, got {:?}", other),
        }
    }

    #[test]
    fn test_no_wedge_names() {
        assert_eq!(classify_wedge(&wedge("", "WedgeBottomToTop", 15.0)), WedgeClass::NoWedge);
        assert_eq!(classify_wedge(&wedge("No Wedge", "", 0.0)), WedgeClass::NoWedge);
        assert_eq!(classify_wedge(&wedge("", "", 0.0)).count(), 0);
    }

    #[test]
    fn test_dynamic_wedge_in() {
        let spec = spec_of(classify_wedge(&wedge("EDW15", "WedgeBottomToTop", 15.0)));
        assert_eq!(spec.wedge_type, WedgeType::Dynamic);
        assert_eq!(spec.id, "EDW1515IN");
        assert_eq!(spec.orientation_code(), "0");
        assert_eq!(spec.angle, 15.0);
    }

    #[test]
    fn test_dynamic_wedge_out_lowercase_name() {
        let spec = spec_of(classify_wedge(&wedge("edw60", "WedgeTopToBottom", 60.0)));
        assert_eq!(spec.wedge_type, WedgeType::Dynamic);
        assert_eq!(spec.id, "EDW6060OUT");
        assert_eq!(spec.orientation_code(), "180");
    }

    #[test]
    fn test_dynamic_wedge_mixed_case_name() {
        let spec = spec_of(classify_wedge(&wedge("Edw", "WedgeBottomToTop", 30.0)));
        assert_eq!(spec.id, "EDW30IN");
    }

    #[test]
    fn test_dynamic_wedge_lateral_orientation_unclassified() {
        let class = classify_wedge(&wedge("EDW30", "WedgeLeftToRight", 30.0));
        assert_eq!(class, WedgeClass::Unclassified { name: "EDW30".to_string() });
        assert_eq!(class.count(), 0);
    }

    #[test]
    fn test_standard_wedge_full_table() {
        let cases = [
            (15.0, "WedgeRightToLeft", "W15R30", "90"),
            (15.0, "WedgeLeftToRight", "W15L30", "270"),
            (15.0, "WedgeTopToBottom", "W15OUT30", "180"),
            (15.0, "WedgeBottomToTop", "W15IN30", "0"),
            (30.0, "WedgeRightToLeft", "W30R30", "90"),
            (30.0, "WedgeLeftToRight", "W30L30", "270"),
            (30.0, "WedgeTopToBottom", "W30OUT30", "180"),
            (30.0, "WedgeBottomToTop", "W30IN30", "0"),
            (45.0, "WedgeRightToLeft", "W45R20", "90"),
            (45.0, "WedgeLeftToRight", "W45L20", "270"),
            (45.0, "WedgeTopToBottom", "W45OUT20", "180"),
            (45.0, "WedgeBottomToTop", "W45IN20", "0"),
            (60.0, "WedgeRightToLeft", "W60R15", "90"),
            (60.0, "WedgeLeftToRight", "W60L15", "270"),
            (60.0, "WedgeTopToBottom", "W60OUT15", "180"),
            (60.0, "WedgeBottomToTop", "W60IN15", "0"),
        ];

        for (angle, orientation, id, code) in cases {
            let spec = spec_of(classify_wedge(&wedge("UP", orientation, angle)));
            assert_eq!(spec.wedge_type, WedgeType::Standard, "{} {}", angle, orientation);
            assert_eq!(spec.id, id, "{} {}", angle, orientation);
            assert_eq!(spec.orientation_code(), code, "{} {}", angle, orientation);
            assert_eq!(spec.angle, angle);
        }
    }

    #[test]
    fn test_standard_wedge_fractional_angle_truncates() {
        let spec = spec_of(classify_wedge(&wedge("W45UP", "WedgeRightToLeft", 45.4)));
        assert_eq!(spec.id, "W45R20");
        assert_eq!(spec.angle, 45.0);
    }

    #[test]
    fn test_standard_wedge_unknown_angle_unclassified() {
        let class = classify_wedge(&wedge("UP", "WedgeRightToLeft", 20.0));
        assert!(matches!(class, WedgeClass::Unclassified { .. }));
    }

    #[test]
    fn test_standard_wedge_unknown_orientation_unclassified() {
        let class = classify_wedge(&wedge("UP", "Sideways", 15.0));
        assert!(matches!(class, WedgeClass::Unclassified { .. }));
    }

    #[test]
    fn test_edw_rule_takes_precedence_over_up() {
        let spec = spec_of(classify_wedge(&wedge("EDW-UP", "WedgeBottomToTop", 45.0)));
        assert_eq!(spec.wedge_type, WedgeType::Dynamic);
    }

    #[test]
    fn test_up_rule_is_case_sensitive() {
        let class = classify_wedge(&wedge("up", "WedgeBottomToTop", 15.0));
        assert_eq!(class, WedgeClass::Unclassified { name: "up".to_string() });
    }

    #[test]
    fn test_unknown_name_unclassified() {
        let class = classify_wedge(&wedge("Virtual", "WedgeBottomToTop", 15.0));
        assert_eq!(class, WedgeClass::Unclassified { name: "Virtual".to_string() });
        assert!(class.spec().is_none());
    }

    #[test]
    fn test_format_angle() {
        assert_eq!(format_angle(15.0), "15");
        assert_eq!(format_angle(12.5), "12.5");
        assert_eq!(format_angle(0.0), "0");
    }
}
