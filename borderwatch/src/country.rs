//! ISO-3166 alpha-2 country codes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two-letter uppercase country code (e.g. `CL`, `AR`).
///
/// Stored inline so readings and decisions can copy it freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode([u8; 2]);

/// Error returned when parsing a malformed country code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid country code '{0}': expected two ASCII letters")]
pub struct CountryCodeError(pub String);

impl CountryCode {
    /// Build a code from a compile-time literal.
    ///
    /// Only used for built-in tables; callers must pass two uppercase ASCII
    /// letters.
    pub(crate) const fn from_static(code: &'static str) -> Self {
        let bytes = code.as_bytes();
        Self([bytes[0], bytes[1]])
    }

    /// Borrow the code as a string slice.
    pub fn as_str(&self) -> &str {
        // Both bytes are validated ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl FromStr for CountryCode {
    type Err = CountryCodeError;

    /// Parses a code case-insensitively; the stored form is uppercase.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let bytes = trimmed.as_bytes();
        if bytes.len() != 2 || !bytes.iter().all(u8::is_ascii_alphabetic) {
            return Err(CountryCodeError(s.to_string()));
        }
        Ok(Self([
            bytes[0].to_ascii_uppercase(),
            bytes[1].to_ascii_uppercase(),
        ]))
    }
}

impl TryFrom<String> for CountryCode {
    type Error = CountryCodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case() {
        let code: CountryCode = "cl".parse().unwrap();
        assert_eq!(code.as_str(), "CL");
        assert_eq!(code, CountryCode::from_static("CL"));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!("".parse::<CountryCode>().is_err());
        assert!("CHL".parse::<CountryCode>().is_err());
        assert!("C1".parse::<CountryCode>().is_err());
        assert!("É".parse::<CountryCode>().is_err());
    }

    #[test]
    fn test_serde_as_plain_string() {
        let code = CountryCode::from_static("AR");
        let json = serde_json::to_string(&code).unwrap();
        assert_eq!(json, "\"AR\"");

        let back: CountryCode = serde_json::from_str("\"ar\"").unwrap();
        assert_eq!(back, code);
        assert!(serde_json::from_str::<CountryCode>("\"ARG\"").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(CountryCode::from_static("BR").to_string(), "BR");
    }
}
