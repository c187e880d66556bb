//! Region codes and the three routing classes they map to.
//!
//! Every region code resolves to a class; unknown codes fall back to
//! [`RegionClass::Global`] instead of failing.

use serde::{Deserialize, Serialize};

/// Region code used when a request does not name one.
pub const DEFAULT_REGION_CODE: &str = "IND";

/// Routing class: selects the upstream endpoint and credential source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionClass {
    India,
    Americas,
    Global,
}

impl RegionClass {
    pub const ALL: [RegionClass; 3] = [Self::India, Self::Americas, Self::Global];

    /// Region codes that route to this class. `Global` also catches every
    /// unlisted code.
    pub fn codes(&self) -> &'static [&'static str] {
        match self {
            Self::India => &["IND"],
            Self::Americas => &["BR", "US", "SAC", "NA"],
            Self::Global => &[],
        }
    }

    fn from_code(code: &str) -> Self {
        match code {
            "IND" => Self::India,
            "BR" | "US" | "SAC" | "NA" => Self::Americas,
            _ => Self::Global,
        }
    }
}

impl std::fmt::Display for RegionClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::India => write!(f, "india"),
            Self::Americas => write!(f, "americas"),
            Self::Global => write!(f, "global"),
        }
    }
}

/// A caller-supplied region code together with its resolved class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    code: String,
    class: RegionClass,
}

impl Region {
    /// Resolve a region code, case-insensitively.
    pub fn parse(code: &str) -> Self {
        let code = code.trim().to_ascii_uppercase();
        let class = RegionClass::from_code(&code);
        Self { code, class }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn class(&self) -> RegionClass {
        self.class
    }
}

impl Default for Region {
    fn default() -> Self {
        Self::parse(DEFAULT_REGION_CODE)
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code, self.class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_codes_route_to_their_class() {
        assert_eq!(Region::parse("IND").class(), RegionClass::India);
        for code in ["BR", "US", "SAC", "NA"] {
            assert_eq!(Region::parse(code).class(), RegionClass::Americas, "{code}");
        }
    }

    #[test]
    fn codes_are_case_insensitive() {
        let r = Region::parse(" sac ");
        assert_eq!(r.code(), "SAC");
        assert_eq!(r.class(), RegionClass::Americas);
        assert_eq!(Region::parse("ind").class(), RegionClass::India);
    }

    #[test]
    fn unknown_codes_fall_back_to_global() {
        assert_eq!(Region::parse("BD").class(), RegionClass::Global);
        assert_eq!(Region::parse("").class(), RegionClass::Global);
        assert_eq!(Region::parse("zz-top").class(), RegionClass::Global);
    }

    #[test]
    fn default_region_is_india() {
        assert_eq!(Region::default().class(), RegionClass::India);
    }

    #[test]
    fn listed_codes_are_disjoint() {
        for class in RegionClass::ALL {
            for code in class.codes() {
                assert_eq!(Region::parse(code).class(), class);
            }
        }
    }
}
