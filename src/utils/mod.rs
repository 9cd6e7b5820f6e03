// Tue Jan 13 2026 - Alex

pub mod logging;

pub use logging::LoggingUtils;

/// Parses an integer literal the way a user types one at a prompt: decimal,
/// `0x`/`0X` hex, optionally negative. `None` for anything else.
pub fn auto_int(s: &str) -> Option<i128> {
    let s = s.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };

    let magnitude = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) if !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit()) => {
            i128::from_str_radix(hex, 16).ok()?
        }
        Some(_) => return None,
        None if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) => digits.parse::<i128>().ok()?,
        None => return None,
    };

    Some(if negative { -magnitude } else { magnitude })
}

pub fn hex_string_spaced(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_int() {
        assert_eq!(auto_int("1"), Some(1));
        assert_eq!(auto_int("0x10"), Some(16));
        assert_eq!(auto_int("0XfF"), Some(255));
        assert_eq!(auto_int("-0x10"), Some(-16));
        assert_eq!(auto_int(" 42 "), Some(42));
        assert_eq!(auto_int("-7"), Some(-7));
    }

    #[test]
    fn test_auto_int_rejects_names() {
        assert_eq!(auto_int(""), None);
        assert_eq!(auto_int("0x"), None);
        assert_eq!(auto_int("main"), None);
        assert_eq!(auto_int("deadbeef"), None);
        assert_eq!(auto_int("12abc"), None);
        assert_eq!(auto_int("-"), None);
    }

    #[test]
    fn test_formatting() {
        assert_eq!(hex_string_spaced(&[0xde, 0xad, 0x01]), "de ad 01");
    }
}
