//! Mirror origins and inferred network regions

use std::fmt;

/// One of the two fixed mirror origins, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    /// Global mirror, preferred whenever it serves a catalog
    Primary,
    /// Regional mirror, used when the primary is unavailable
    Secondary,
}

impl Origin {
    /// Origins in fixed priority order
    pub const PRIORITY: [Origin; 2] = [Origin::Primary, Origin::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Primary => "primary",
            Origin::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Network region inferred from differential reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Region {
    #[default]
    Default,
    /// Mirrors reachable while the general external target is not
    China,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::Default => "default",
            Region::China => "china",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base URLs of both mirror origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirrors {
    pub primary: String,
    pub secondary: String,
}

impl Mirrors {
    pub fn base_url(&self, origin: Origin) -> &str {
        match origin {
            Origin::Primary => &self.primary,
            Origin::Secondary => &self.secondary,
        }
    }

    /// Base URL for artifacts that are not in any catalog
    ///
    /// Uses the active origin when there is one, otherwise the secondary
    /// mirror for the restricted region and the primary mirror elsewhere.
    pub fn fallback_base_url(&self, active: Option<Origin>, region: Region) -> &str {
        match (active, region) {
            (Some(origin), _) => self.base_url(origin),
            (None, Region::China) => &self.secondary,
            (None, Region::Default) => &self.primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn mirrors() -> Mirrors {
        Mirrors {
            primary: "https://primary.example.com".to_string(),
            secondary: "https://secondary.example.com".to_string(),
        }
    }

    #[rstest]
    #[case(Some(Origin::Primary), Region::China, "https://primary.example.com")]
    #[case(Some(Origin::Secondary), Region::Default, "https://secondary.example.com")]
    #[case(None, Region::China, "https://secondary.example.com")]
    #[case(None, Region::Default, "https://primary.example.com")]
    fn fallback_base_url_returns_expected(
        #[case] active: Option<Origin>,
        #[case] region: Region,
        #[case] expected: &str,
    ) {
        assert_eq!(mirrors().fallback_base_url(active, region), expected);
    }
}
