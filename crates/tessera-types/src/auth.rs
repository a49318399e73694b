//! Identity providers.
//!
//! Each provider has a stable wire code and its own registration endpoint
//! on every node. Codes for providers the cluster does not accept (`none`,
//! `amazon`) exist on the wire but never map to a variant.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Wire code meaning "no provider".
pub const NONE_CODE: u8 = 0;

/// Wire code reserved for Amazon, which the cluster does not accept.
pub const AMAZON_CODE: u8 = 5;

/// Rejected provider code or name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unsupported authentication method: {0}")]
pub struct UnsupportedMethod(pub String);

/// An identity provider accepted by the cluster.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMethod {
    Google,
    Github,
    Facebook,
    Microsoft,
    Twitter,
}

impl AuthMethod {
    /// All accepted providers, in wire-code order.
    pub const ALL: [AuthMethod; 5] = [
        AuthMethod::Google,
        AuthMethod::Github,
        AuthMethod::Facebook,
        AuthMethod::Microsoft,
        AuthMethod::Twitter,
    ];

    /// Numeric wire code.
    pub fn code(self) -> u8 {
        match self {
            AuthMethod::Google => 1,
            AuthMethod::Github => 2,
            AuthMethod::Facebook => 3,
            AuthMethod::Microsoft => 4,
            AuthMethod::Twitter => 6,
        }
    }

    /// Lowercase provider name.
    pub fn name(self) -> &'static str {
        match self {
            AuthMethod::Google => "google",
            AuthMethod::Github => "github",
            AuthMethod::Facebook => "facebook",
            AuthMethod::Microsoft => "microsoft",
            AuthMethod::Twitter => "twitter",
        }
    }

    /// Node path that exchanges this provider's credential for a
    /// node-scoped authorization token.
    pub fn registration_path(self) -> String {
        format!("{}/register_{}_jwt", crate::API_PREFIX, self.name())
    }
}

impl TryFrom<u8> for AuthMethod {
    type Error = UnsupportedMethod;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        AuthMethod::ALL
            .into_iter()
            .find(|m| m.code() == code)
            .ok_or_else(|| UnsupportedMethod(format!("code {code}")))
    }
}

impl FromStr for AuthMethod {
    type Err = UnsupportedMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        AuthMethod::ALL
            .into_iter()
            .find(|m| m.name() == lower)
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for method in AuthMethod::ALL {
            assert_eq!(AuthMethod::try_from(method.code()), Ok(method));
        }
    }

    #[test]
    fn test_rejected_codes() {
        assert!(AuthMethod::try_from(NONE_CODE).is_err());
        assert!(AuthMethod::try_from(AMAZON_CODE).is_err());
        assert!(AuthMethod::try_from(42).is_err());
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("GitHub".parse::<AuthMethod>(), Ok(AuthMethod::Github));
        assert_eq!(" twitter ".parse::<AuthMethod>(), Ok(AuthMethod::Twitter));
        assert!("amazon".parse::<AuthMethod>().is_err());
        assert!("none".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn test_registration_paths() {
        assert_eq!(AuthMethod::Google.registration_path(), "/v1/register_google_jwt");
        assert_eq!(
            AuthMethod::Microsoft.registration_path(),
            "/v1/register_microsoft_jwt"
        );
    }
}
