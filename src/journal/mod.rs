pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::routes())
}

/// Mood attached to every journal entry; the tracking chart counts these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Low,
    Struggling,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Great => "great",
            Self::Good => "good",
            Self::Okay => "okay",
            Self::Low => "low",
            Self::Struggling => "struggling",
        }
    }
}

impl FromStr for Mood {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "great" => Ok(Self::Great),
            "good" => Ok(Self::Good),
            "okay" => Ok(Self::Okay),
            "low" => Ok(Self::Low),
            "struggling" => Ok(Self::Struggling),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moods_round_trip() {
        for mood in [Mood::Great, Mood::Good, Mood::Okay, Mood::Low, Mood::Struggling] {
            assert_eq!(mood.as_str().parse::<Mood>(), Ok(mood));
        }
        assert!("fantastic".parse::<Mood>().is_err());
    }
}
