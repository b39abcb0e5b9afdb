//! US region codes.
//!
//! [`StateCode`] is the closed set of USPS codes an [`EventRecord`] can carry.
//! Parsing from a code is strict; [`StateCode::from_name`] and
//! [`StateCode::find_in_text`] are the lenient helpers source adapters use to
//! resolve free text before handing a candidate to the normalizer.
//!
//! [`EventRecord`]: crate::record::EventRecord

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Returned when a string is not a recognized USPS code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown state code: {0:?}")]
pub struct UnknownStateCode(pub String);

macro_rules! state_codes {
    ($($variant:ident => ($code:literal, $name:literal)),+ $(,)?) => {
        /// A USPS state, district or territory code.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum StateCode {
            $($variant,)+
        }

        impl StateCode {
            /// Every recognized code, in declaration order.
            pub const ALL: &'static [StateCode] = &[$(StateCode::$variant,)+];

            /// The two-letter code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(StateCode::$variant => $code,)+
                }
            }

            /// The full name ("Montana").
            pub fn name(&self) -> &'static str {
                match self {
                    $(StateCode::$variant => $name,)+
                }
            }
        }
    };
}

state_codes! {
    Al => ("AL", "Alabama"),
    Ak => ("AK", "Alaska"),
    Az => ("AZ", "Arizona"),
    Ar => ("AR", "Arkansas"),
    Ca => ("CA", "California"),
    Co => ("CO", "Colorado"),
    Ct => ("CT", "Connecticut"),
    De => ("DE", "Delaware"),
    Dc => ("DC", "District of Columbia"),
    Fl => ("FL", "Florida"),
    Ga => ("GA", "Georgia"),
    Hi => ("HI", "Hawaii"),
    Id => ("ID", "Idaho"),
    Il => ("IL", "Illinois"),
    In => ("IN", "Indiana"),
    Ia => ("IA", "Iowa"),
    Ks => ("KS", "Kansas"),
    Ky => ("KY", "Kentucky"),
    La => ("LA", "Louisiana"),
    Me => ("ME", "Maine"),
    Md => ("MD", "Maryland"),
    Ma => ("MA", "Massachusetts"),
    Mi => ("MI", "Michigan"),
    Mn => ("MN", "Minnesota"),
    Ms => ("MS", "Mississippi"),
    Mo => ("MO", "Missouri"),
    Mt => ("MT", "Montana"),
    Ne => ("NE", "Nebraska"),
    Nv => ("NV", "Nevada"),
    Nh => ("NH", "New Hampshire"),
    Nj => ("NJ", "New Jersey"),
    Nm => ("NM", "New Mexico"),
    Ny => ("NY", "New York"),
    Nc => ("NC", "North Carolina"),
    Nd => ("ND", "North Dakota"),
    Oh => ("OH", "Ohio"),
    Ok => ("OK", "Oklahoma"),
    Or => ("OR", "Oregon"),
    Pa => ("PA", "Pennsylvania"),
    Ri => ("RI", "Rhode Island"),
    Sc => ("SC", "South Carolina"),
    Sd => ("SD", "South Dakota"),
    Tn => ("TN", "Tennessee"),
    Tx => ("TX", "Texas"),
    Ut => ("UT", "Utah"),
    Vt => ("VT", "Vermont"),
    Va => ("VA", "Virginia"),
    Wa => ("WA", "Washington"),
    Wv => ("WV", "West Virginia"),
    Wi => ("WI", "Wisconsin"),
    Wy => ("WY", "Wyoming"),
    Pr => ("PR", "Puerto Rico"),
    Gu => ("GU", "Guam"),
    Vi => ("VI", "U.S. Virgin Islands"),
    As => ("AS", "American Samoa"),
    Mp => ("MP", "Northern Mariana Islands"),
}

impl StateCode {
    /// Resolves a full name ("Wyoming", case-insensitive) to a code.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|s| s.name().eq_ignore_ascii_case(name))
    }

    /// Resolves either a two-letter code or a full name.
    pub fn from_code_or_name(value: &str) -> Option<Self> {
        value.parse().ok().or_else(|| Self::from_name(value))
    }

    /// Looks for a region inside free text such as `"Billings, MT 59101"` or
    /// `"Casper, Wyoming"`.
    ///
    /// Only codes from `candidates` are considered. A code matches when it is
    /// a standalone upper-case word; a name matches case-insensitively.
    /// Candidates are tried in order and the first hit wins.
    pub fn find_in_text(text: &str, candidates: &[StateCode]) -> Option<Self> {
        let lowered = text.to_lowercase();
        candidates.iter().copied().find(|state| {
            let code = state.as_str();
            let code_hit = text
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|word| word == code);
            code_hit || lowered.contains(&state.name().to_lowercase())
        })
    }
}

impl fmt::Display for StateCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StateCode {
    type Err = UnknownStateCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|state| state.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownStateCode(s.to_string()))
    }
}

impl Serialize for StateCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for StateCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("MT".parse::<StateCode>().unwrap(), StateCode::Mt);
        assert_eq!(" wy ".parse::<StateCode>().unwrap(), StateCode::Wy);
        assert_eq!("dc".parse::<StateCode>().unwrap(), StateCode::Dc);
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = "XX".parse::<StateCode>().unwrap_err();
        assert_eq!(err, UnknownStateCode("XX".to_string()));
        assert!("Montana".parse::<StateCode>().is_err());
        assert!("".parse::<StateCode>().is_err());
    }

    #[test]
    fn resolves_full_names() {
        assert_eq!(StateCode::from_name("montana"), Some(StateCode::Mt));
        assert_eq!(StateCode::from_name("New Mexico"), Some(StateCode::Nm));
        assert_eq!(StateCode::from_name("Narnia"), None);
        assert_eq!(StateCode::from_code_or_name("Wyoming"), Some(StateCode::Wy));
        assert_eq!(StateCode::from_code_or_name("mt"), Some(StateCode::Mt));
    }

    #[test]
    fn finds_region_in_free_text() {
        let both = [StateCode::Mt, StateCode::Wy];
        assert_eq!(
            StateCode::find_in_text("123 Main St, Billings, MT 59101", &both),
            Some(StateCode::Mt)
        );
        assert_eq!(
            StateCode::find_in_text("Casper, Wyoming", &both),
            Some(StateCode::Wy)
        );
        // "MT" inside a word is not a code.
        assert_eq!(StateCode::find_in_text("SUMMIT HALL", &both), None);
        assert_eq!(StateCode::find_in_text("Denver, CO", &both), None);
    }

    #[test]
    fn serde_uses_two_letter_code() {
        let json = serde_json::to_string(&StateCode::Wy).unwrap();
        assert_eq!(json, "\"WY\"");
        let back: StateCode = serde_json::from_str("\"mt\"").unwrap();
        assert_eq!(back, StateCode::Mt);
        assert!(serde_json::from_str::<StateCode>("\"ZZ\"").is_err());
    }

    #[test]
    fn all_codes_are_unique() {
        let mut codes: Vec<_> = StateCode::ALL.iter().map(|s| s.as_str()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), StateCode::ALL.len());
        assert_eq!(StateCode::ALL.len(), 56);
    }
}
