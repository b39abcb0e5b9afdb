//! City/state resolution from free-text locations.

use vnn_core::StateCode;

/// A region found in a location string, with the city in front of it when
/// the text has the usual `"..., City, ST"` shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlace {
    pub city: Option<String>,
    pub state: StateCode,
}

/// Resolves `text` against `candidates`, in order.
///
/// `"123 Main St, Billings, MT 59101"` gives Billings/MT. A bare code or a
/// full state name elsewhere in the text gives the state without a city.
pub fn resolve_place(text: &str, candidates: &[StateCode]) -> Option<ResolvedPlace> {
    for &state in candidates {
        let marker = format!(", {}", state.as_str());
        if let Some((before, after)) = text.split_once(&marker) {
            // ", MTN" is not Montana.
            if after.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                continue;
            }
            let city = before
                .rsplit(',')
                .next()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string);
            return Some(ResolvedPlace { city, state });
        }
    }

    StateCode::find_in_text(text, candidates).map(|state| ResolvedPlace { city: None, state })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MT_WY: &[StateCode] = &[StateCode::Mt, StateCode::Wy];

    #[test]
    fn city_before_state_code() {
        let place = resolve_place("MetraPark, 308 6th Ave N, Billings, MT 59101", MT_WY).unwrap();
        assert_eq!(place.city.as_deref(), Some("Billings"));
        assert_eq!(place.state, StateCode::Mt);
    }

    #[test]
    fn wyoming_location() {
        let place = resolve_place("Casper, WY", MT_WY).unwrap();
        assert_eq!(place.city.as_deref(), Some("Casper"));
        assert_eq!(place.state, StateCode::Wy);
    }

    #[test]
    fn state_name_without_city() {
        let place = resolve_place("Somewhere in Wyoming", MT_WY).unwrap();
        assert_eq!(place, ResolvedPlace { city: None, state: StateCode::Wy });
    }

    #[test]
    fn code_must_be_a_whole_word() {
        assert_eq!(resolve_place("Big Sky, MTN Resort", MT_WY), None);
    }

    #[test]
    fn out_of_candidate_region() {
        assert_eq!(resolve_place("Boise, ID", MT_WY), None);
        assert!(resolve_place("Boise, ID", &[StateCode::Id]).is_some());
    }

    #[test]
    fn leading_code_has_no_city() {
        let place = resolve_place(", MT", MT_WY).unwrap();
        assert_eq!(place.city, None);
    }
}
