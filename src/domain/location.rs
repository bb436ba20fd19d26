use std::sync::LazyLock;

use regex::Regex;

/// Area summary used when the alert text names no province, district or
/// sub-district.
pub const AREA_PLACEHOLDER: &str = "See the source link below for the affected area.";

// Thai bulletins write numbers in either Arabic or Thai numerals.
static DECIMAL_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9๐-๙]+\.[0-9๐-๙]+").expect("decimal token pattern")
});

const THAI_ZERO: u32 = '๐' as u32;

// Province, district and sub-district designators, full or abbreviated.
static PLACE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:จังหวัด|จ\.)\s*\S+|(?:อำเภอ|อ\.)\s*\S+|(?:ตำบล|ต\.)\s*\S+")
        .expect("place marker pattern")
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub coordinates: Option<Coordinates>,
    pub area: String,
}

/// Pull a coordinate pair and an area summary out of free-form alert text.
///
/// The first two decimal numbers are taken as latitude and longitude with no
/// range check. The area is the whole text when a place marker is present,
/// otherwise [`AREA_PLACEHOLDER`].
pub fn extract_location(text: &str) -> Location {
    let mut numbers = DECIMAL_TOKEN
        .find_iter(text)
        .filter_map(|m| parse_decimal(m.as_str()));

    let coordinates = match (numbers.next(), numbers.next()) {
        (Some(latitude), Some(longitude)) => Some(Coordinates {
            latitude,
            longitude,
        }),
        _ => None,
    };

    let area = if PLACE_MARKER.is_match(text) {
        text.to_string()
    } else {
        AREA_PLACEHOLDER.to_string()
    };

    Location { coordinates, area }
}

fn parse_decimal(token: &str) -> Option<f64> {
    let ascii: String = token
        .chars()
        .map(|c| match c {
            '๐'..='๙' => char::from_digit(c as u32 - THAI_ZERO, 10).unwrap_or(c),
            other => other,
        })
        .collect();

    ascii.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_province_with_coordinates() {
        let text = "แผ่นดินไหว จังหวัดเชียงราย 19.9 99.8";
        let location = extract_location(text);

        assert_eq!(
            location.coordinates,
            Some(Coordinates {
                latitude: 19.9,
                longitude: 99.8
            })
        );
        assert_eq!(location.area, text);
    }

    #[test]
    fn test_thai_numerals() {
        let text = "แผ่นดินไหว จังหวัดเชียงราย ๑๙.๙ ๙๙.๘";
        let location = extract_location(text);

        assert_eq!(
            location.coordinates,
            Some(Coordinates {
                latitude: 19.9,
                longitude: 99.8
            })
        );
        assert_eq!(location.area, text);
    }

    #[test]
    fn test_mixed_numerals_keep_order() {
        let coords = extract_location("ขนาด ๔.๒ ที่ 18.5 98.9")
            .coordinates
            .unwrap();

        assert_eq!(coords.latitude, 4.2);
        assert_eq!(coords.longitude, 18.5);
    }

    #[test]
    fn test_first_two_tokens_win_in_order() {
        let location = extract_location("M 4.6 at 12.25 depth 10.0 km");
        let coords = location.coordinates.unwrap();

        assert_eq!(coords.latitude, 4.6);
        assert_eq!(coords.longitude, 12.25);
    }

    #[test]
    fn test_single_token_yields_no_coordinates() {
        let location = extract_location("Magnitude 5.1 near the border");
        assert!(location.coordinates.is_none());
    }

    #[test]
    fn test_integers_are_not_coordinates() {
        let location = extract_location("Rain 20 to 40 mm over 3 days");
        assert!(location.coordinates.is_none());
    }

    #[test]
    fn test_abbreviated_markers() {
        for text in ["ฝนตกหนัก จ.น่าน", "น้ำท่วม อ. เมือง", "ดินถล่ม ต.บ่อเกลือ", "อำเภอแม่สาย"] {
            assert_eq!(extract_location(text).area, text, "marker not found in {}", text);
        }
    }

    #[test]
    fn test_placeholder_without_marker() {
        let location = extract_location("Tropical storm warning 15.5 101.2");

        assert_eq!(location.area, AREA_PLACEHOLDER);
        assert!(location.coordinates.is_some());
    }

    #[test]
    fn test_empty_text() {
        let location = extract_location("");

        assert!(location.coordinates.is_none());
        assert_eq!(location.area, AREA_PLACEHOLDER);
    }
}
