use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Therapist persona: a named system-prompt preset selecting the model's
/// conversational style. The catalogue is fixed; conversations store the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Therapist {
    Mira,
    Sol,
    Ezra,
    Nova,
}

const SHARED_GUARDRAILS: &str = "You are not a medical professional and must say so if asked. \
Never diagnose, never discuss medication. If the user mentions self-harm or harming others, \
gently encourage them to contact a crisis line or emergency services, and provide the 988 \
lifeline number for users in the US. Keep responses warm and conversational, usually under \
150 words.";

impl Therapist {
    pub const ALL: [Therapist; 4] = [Self::Mira, Self::Sol, Self::Ezra, Self::Nova];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mira => "mira",
            Self::Sol => "sol",
            Self::Ezra => "ezra",
            Self::Nova => "nova",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Mira => "Mira",
            Self::Sol => "Sol",
            Self::Ezra => "Ezra",
            Self::Nova => "Nova",
        }
    }

    pub fn specialty(&self) -> &'static str {
        match self {
            Self::Mira => "empathetic listening",
            Self::Sol => "CBT-style reframing",
            Self::Ezra => "mindfulness and grounding",
            Self::Nova => "motivation and habits",
        }
    }

    pub fn system_prompt(&self) -> String {
        let style = match self {
            Self::Mira => {
                "You are Mira, a warm and empathetic listener. Reflect the user's feelings \
                 back to them, validate before anything else, and ask gentle open questions. \
                 Avoid giving direct advice unless asked."
            }
            Self::Sol => {
                "You are Sol, a practical guide drawing on CBT techniques. Help the user \
                 notice thought patterns, name cognitive distortions in plain language, and \
                 suggest small reframing exercises."
            }
            Self::Ezra => {
                "You are Ezra, a calm mindfulness companion. Bring the user back to the \
                 present moment, offer short breathing or grounding exercises, and keep a \
                 slow, spacious tone."
            }
            Self::Nova => {
                "You are Nova, an energetic motivational coach. Help the user break goals \
                 into small steps, celebrate progress, and keep momentum without dismissing \
                 hard feelings."
            }
        };
        format!("{style} {SHARED_GUARDRAILS}")
    }
}

impl FromStr for Therapist {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mira" => Ok(Self::Mira),
            "sol" => Ok(Self::Sol),
            "ezra" => Ok(Self::Ezra),
            "nova" => Ok(Self::Nova),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip() {
        for t in Therapist::ALL {
            assert_eq!(t.as_str().parse::<Therapist>(), Ok(t));
        }
        assert!("freud".parse::<Therapist>().is_err());
    }

    #[test]
    fn serde_uses_lowercase_ids() {
        assert_eq!(serde_json::to_string(&Therapist::Mira).unwrap(), "\"mira\"");
        let t: Therapist = serde_json::from_str("\"ezra\"").unwrap();
        assert_eq!(t, Therapist::Ezra);
    }

    #[test]
    fn every_prompt_carries_the_guardrails() {
        for t in Therapist::ALL {
            let prompt = t.system_prompt();
            assert!(prompt.contains("not a medical professional"), "{t:?}");
            assert!(prompt.contains("988"), "{t:?}");
        }
    }
}
