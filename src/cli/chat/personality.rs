use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One of the predefined Sage identities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Personality {
    Littlefinger,
    Mac,
    Lawyer,
    Businessman,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown personality '{0}' (expected one of: littlefinger, mac, lawyer, businessman)")]
pub struct UnknownPersonality(pub String);

impl Personality {
    /// Sidebar order.
    pub const ALL: [Personality; 4] = [
        Personality::Littlefinger,
        Personality::Mac,
        Personality::Lawyer,
        Personality::Businessman,
    ];

    /// The key sent to the backend as the `personality` query parameter.
    pub fn key(self) -> &'static str {
        match self {
            Personality::Littlefinger => "littlefinger",
            Personality::Mac => "mac",
            Personality::Lawyer => "lawyer",
            Personality::Businessman => "businessman",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Personality::Littlefinger => "Littlefinger",
            Personality::Mac => "Mac",
            Personality::Lawyer => "Lawyer",
            Personality::Businessman => "Businessman",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Personality::Littlefinger => "🗡️",
            Personality::Mac => "🌿",
            Personality::Lawyer => "⚖️",
            Personality::Businessman => "🚀",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Personality::Littlefinger => {
                "\"Humble steward of coins and secrets.\" Sly, medieval tone with Westerosi analogies."
            }
            Personality::Mac => {
                "Yo, let's grow your green like premium bud. Stoned-but-wise financial guru."
            }
            Personality::Lawyer => {
                "\"You want a retirement plan or a legacy? Let's draft terms.\" Cocky, strategic."
            }
            Personality::Businessman => {
                "\"Let's engineer wealth—what's your Mars colony budget?\" Visionary intensity."
            }
        }
    }

    /// The first message a freshly selected Sage says.
    pub fn greeting(self) -> &'static str {
        match self {
            Personality::Littlefinger => {
                "Ah, a new player in the game of coins. Let's discuss how to make your wealth grow, shall we?"
            }
            Personality::Mac => {
                "Yo, what's good? Let's talk about growing that green, both in your garden and your bank account."
            }
            Personality::Lawyer => {
                "Counselor at your service. Let's draft a strategy for your financial future."
            }
            Personality::Businessman => {
                "Time to engineer your financial success. What's your vision for wealth?"
            }
        }
    }

    /// Case-insensitive match against key, title and description.
    /// A blank query matches everything.
    pub fn search(query: &str) -> Vec<Personality> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Self::ALL.to_vec();
        }

        Self::ALL
            .into_iter()
            .filter(|p| {
                p.key().contains(&query)
                    || p.title().to_lowercase().contains(&query)
                    || p.description().to_lowercase().contains(&query)
            })
            .collect()
    }
}

impl FromStr for Personality {
    type Err = UnknownPersonality;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|p| p.key() == key)
            .ok_or_else(|| UnknownPersonality(s.trim().to_string()))
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
