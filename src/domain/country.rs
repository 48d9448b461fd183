//! Supported country set.

use serde::Serialize;

/// Countries the content API carries feeds for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Country {
    #[default]
    Zimbabwe,
    SouthAfrica,
    Kenya,
    Nigeria,
    Ghana,
    Uganda,
    Tanzania,
    Rwanda,
    Ethiopia,
    Botswana,
    Zambia,
    Malawi,
    Egypt,
    Morocco,
    Namibia,
    Mozambique,
}

impl Country {
    pub const ALL: [Country; 16] = [
        Country::Zimbabwe,
        Country::SouthAfrica,
        Country::Kenya,
        Country::Nigeria,
        Country::Ghana,
        Country::Uganda,
        Country::Tanzania,
        Country::Rwanda,
        Country::Ethiopia,
        Country::Botswana,
        Country::Zambia,
        Country::Malawi,
        Country::Egypt,
        Country::Morocco,
        Country::Namibia,
        Country::Mozambique,
    ];

    /// Exact code lookup (after trimming and case folding). No partial matches.
    pub fn from_code(raw: &str) -> Option<Self> {
        let code = raw.trim();
        Self::ALL
            .into_iter()
            .find(|country| country.code().eq_ignore_ascii_case(code))
    }

    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(Self::from_code).unwrap_or_default()
    }

    pub fn code(self) -> &'static str {
        match self {
            Country::Zimbabwe => "ZW",
            Country::SouthAfrica => "ZA",
            Country::Kenya => "KE",
            Country::Nigeria => "NG",
            Country::Ghana => "GH",
            Country::Uganda => "UG",
            Country::Tanzania => "TZ",
            Country::Rwanda => "RW",
            Country::Ethiopia => "ET",
            Country::Botswana => "BW",
            Country::Zambia => "ZM",
            Country::Malawi => "MW",
            Country::Egypt => "EG",
            Country::Morocco => "MA",
            Country::Namibia => "NA",
            Country::Mozambique => "MZ",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Country::Zimbabwe => "Zimbabwe",
            Country::SouthAfrica => "South Africa",
            Country::Kenya => "Kenya",
            Country::Nigeria => "Nigeria",
            Country::Ghana => "Ghana",
            Country::Uganda => "Uganda",
            Country::Tanzania => "Tanzania",
            Country::Rwanda => "Rwanda",
            Country::Ethiopia => "Ethiopia",
            Country::Botswana => "Botswana",
            Country::Zambia => "Zambia",
            Country::Malawi => "Malawi",
            Country::Egypt => "Egypt",
            Country::Morocco => "Morocco",
            Country::Namibia => "Namibia",
            Country::Mozambique => "Mozambique",
        }
    }

    /// Regional-indicator flag built from the country code.
    pub fn flag(self) -> String {
        self.code()
            .bytes()
            .filter_map(|letter| char::from_u32(0x1F1E6 + u32::from(letter - b'A')))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_codes_fall_back_to_zimbabwe() {
        for raw in ["", "US", "K", "KEN", "Z W", "zw1"] {
            assert_eq!(Country::parse(Some(raw)), Country::Zimbabwe, "{raw:?}");
        }
        assert_eq!(Country::parse(None), Country::Zimbabwe);
    }

    #[test]
    fn codes_round_trip() {
        for country in Country::ALL {
            assert_eq!(Country::from_code(country.code()), Some(country));
        }
        assert_eq!(Country::parse(Some(" ke ")), Country::Kenya);
    }

    #[test]
    fn flag_uses_regional_indicators() {
        assert_eq!(Country::Zimbabwe.flag(), "\u{1F1FF}\u{1F1FC}");
        assert_eq!(Country::Kenya.flag(), "🇰🇪");
    }
}
