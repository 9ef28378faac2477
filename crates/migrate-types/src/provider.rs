//! The three code-hosting providers the migration engine understands.

use serde::{Deserialize, Serialize};

/// A supported code-hosting provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// GitHub.com or a GitHub Enterprise Server instance.
    GitHub,
    /// GitLab.com or a self-managed GitLab instance.
    GitLab,
    /// Bitbucket Cloud (`bitbucket.org`).
    Bitbucket,
}

impl Provider {
    /// Returns the lowercase name used in requests and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::GitHub => "github",
            Provider::GitLab => "gitlab",
            Provider::Bitbucket => "bitbucket",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "github" => Ok(Provider::GitHub),
            "gitlab" => Ok(Provider::GitLab),
            "bitbucket" => Ok(Provider::Bitbucket),
            other => Err(format!("unknown provider: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        for p in [Provider::GitHub, Provider::GitLab, Provider::Bitbucket] {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("GitHub".parse::<Provider>().unwrap(), Provider::GitHub);
        assert_eq!("BITBUCKET".parse::<Provider>().unwrap(), Provider::Bitbucket);
    }

    #[test]
    fn rejects_unknown_provider() {
        assert!("sourcehut".parse::<Provider>().is_err());
    }
}
