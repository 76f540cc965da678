//! STEOP classification of catalog course codes.
//!
//! STEOP ("Studieneingangs- und Orientierungsphase") is the orientation phase
//! of Austrian curricula. Courses are classified against two static
//! allow-lists: lectures that are mandatory during the phase, and companion
//! courses that may be taken alongside them before the phase is passed.

/// Course codes that are mandatory during the orientation phase.
pub const STEOP_REQUIRED: &[&str] = &[
    "VL.ALGEBRA",
    "VL.ANALYSIS",
    "VL.EINFUEHRUNG.INFORMATIK",
    "VL.PROGRAMMIERUNG.1",
    "VL.TECHNISCHE.GRUNDLAGEN",
];

/// Course codes that may be taken before the orientation phase is passed.
pub const STEOP_ALLOWED: &[&str] = &[
    "UE.ALGEBRA",
    "UE.ANALYSIS",
    "UE.EINFUEHRUNG.INFORMATIK",
    "UE.PROGRAMMIERUNG.1",
    "UE.TECHNISCHE.GRUNDLAGEN",
    "VL.MATHEMATIK.DISKRET",
    "UE.MATHEMATIK.DISKRET",
];

/// STEOP flags for a single course code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SteopFlags {
    pub required: bool,
    pub allowed: bool,
}

/// Classify a course code against the static STEOP lists.
///
/// Pure lookup: a required course is always also allowed. Codes on neither
/// list are restricted until the phase is completed.
pub fn classify(course_code: &str) -> SteopFlags {
    let required = STEOP_REQUIRED.contains(&course_code);
    SteopFlags {
        required,
        allowed: required || STEOP_ALLOWED.contains(&course_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_lecture() {
        let flags = classify("VL.ALGEBRA");
        assert!(flags.required);
        assert!(flags.allowed);
    }

    #[test]
    fn test_allowed_companion_course() {
        let flags = classify("UE.ALGEBRA");
        assert!(!flags.required);
        assert!(flags.allowed);
    }

    #[test]
    fn test_restricted_course() {
        let flags = classify("VL.DATENBANKEN");
        assert!(!flags.required);
        assert!(!flags.allowed);
    }

    #[test]
    fn test_classification_is_idempotent() {
        assert_eq!(classify("VL.ANALYSIS"), classify("VL.ANALYSIS"));
        assert_eq!(classify("unknown"), classify("unknown"));
    }

    #[test]
    fn test_required_implies_allowed() {
        for code in STEOP_REQUIRED {
            assert!(classify(code).allowed, "{code} must be allowed");
        }
    }
}
