//! Country display metadata
//!
//! Maps ISO 3166-1 alpha-2 codes to display names and flag emoji for the
//! country index built during normalization. Unknown codes fall back to the
//! code itself; the `INT` pseudo-code used for playlist channels gets a
//! globe.

/// Display name for a country code, falling back to the code itself
pub fn country_name(code: &str) -> String {
    let name = match code.to_ascii_uppercase().as_str() {
        "INT" => "International",
        "AR" => "Argentina",
        "AT" => "Austria",
        "AU" => "Australia",
        "BE" => "Belgium",
        "BG" => "Bulgaria",
        "BR" => "Brazil",
        "CA" => "Canada",
        "CH" => "Switzerland",
        "CL" => "Chile",
        "CN" => "China",
        "CO" => "Colombia",
        "CZ" => "Czech Republic",
        "DE" => "Germany",
        "DK" => "Denmark",
        "EG" => "Egypt",
        "ES" => "Spain",
        "FI" => "Finland",
        "FR" => "France",
        "GB" => "United Kingdom",
        "GR" => "Greece",
        "HK" => "Hong Kong",
        "HU" => "Hungary",
        "ID" => "Indonesia",
        "IE" => "Ireland",
        "IL" => "Israel",
        "IN" => "India",
        "IQ" => "Iraq",
        "IR" => "Iran",
        "IT" => "Italy",
        "JP" => "Japan",
        "KR" => "South Korea",
        "MX" => "Mexico",
        "MY" => "Malaysia",
        "NG" => "Nigeria",
        "NL" => "Netherlands",
        "NO" => "Norway",
        "NZ" => "New Zealand",
        "PE" => "Peru",
        "PH" => "Philippines",
        "PK" => "Pakistan",
        "PL" => "Poland",
        "PT" => "Portugal",
        "RO" => "Romania",
        "RS" => "Serbia",
        "RU" => "Russia",
        "SA" => "Saudi Arabia",
        "SE" => "Sweden",
        "SG" => "Singapore",
        "TH" => "Thailand",
        "TR" => "Turkey",
        "TW" => "Taiwan",
        "UA" => "Ukraine",
        "US" => "United States",
        "VE" => "Venezuela",
        "VN" => "Vietnam",
        "ZA" => "South Africa",
        _ => return code.to_string(),
    };

    name.to_string()
}

/// Flag emoji for a country code via Unicode regional indicators.
/// Non-alphabetic or non-two-letter codes get a globe.
pub fn country_flag(code: &str) -> String {
    let code = code.to_ascii_uppercase();

    if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
        return "\u{1F310}".to_string(); // 🌐
    }

    code.bytes()
        .filter_map(|b| char::from_u32(0x1F1E6 + (b - b'A') as u32))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_country_name() {
        assert_eq!(country_name("US"), "United States");
        assert_eq!(country_name("gb"), "United Kingdom");
    }

    #[test]
    fn test_unknown_code_falls_back_to_code() {
        assert_eq!(country_name("XX"), "XX");
    }

    #[test]
    fn test_flag_from_regional_indicators() {
        assert_eq!(country_flag("US"), "\u{1F1FA}\u{1F1F8}");
        assert_eq!(country_flag("gb"), "\u{1F1EC}\u{1F1E7}");
    }

    #[test]
    fn test_int_pseudo_code_gets_globe() {
        assert_eq!(country_flag("INT"), "\u{1F310}");
        assert_eq!(country_name("INT"), "International");
    }
}
