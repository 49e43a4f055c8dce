//! Keyword-based rhetorical type classification.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EssayType {
    #[serde(rename = "Argumentative Essay")]
    Argumentative,
    #[serde(rename = "Narrative Essay")]
    Narrative,
    #[serde(rename = "Analytical Essay")]
    Analytical,
    #[serde(rename = "Expository Essay")]
    Expository,
    #[serde(rename = "Descriptive Essay")]
    Descriptive,
    #[serde(rename = "Persuasive Essay")]
    Persuasive,
}

impl EssayType {
    /// Classification order; earlier entries win keyword-count ties.
    pub const ALL: [EssayType; 6] = [
        EssayType::Argumentative,
        EssayType::Narrative,
        EssayType::Analytical,
        EssayType::Expository,
        EssayType::Descriptive,
        EssayType::Persuasive,
    ];

    pub fn display_name(self) -> &'static str {
        match self {
            EssayType::Argumentative => "Argumentative Essay",
            EssayType::Narrative => "Narrative Essay",
            EssayType::Analytical => "Analytical Essay",
            EssayType::Expository => "Expository Essay",
            EssayType::Descriptive => "Descriptive Essay",
            EssayType::Persuasive => "Persuasive Essay",
        }
    }

    pub fn keywords(self) -> &'static [&'static str] {
        match self {
            EssayType::Argumentative => &[
                "argue",
                "thesis",
                "evidence",
                "counterargument",
                "claim",
                "support",
                "oppose",
                "debate",
            ],
            EssayType::Narrative => &[
                "story",
                "experience",
                "happened",
                "remember",
                "narrative",
                "personal",
                "journey",
            ],
            EssayType::Analytical => &[
                "analyze",
                "literary",
                "author",
                "character",
                "theme",
                "symbolism",
                "literary device",
            ],
            EssayType::Expository => &[
                "explain",
                "inform",
                "describe",
                "process",
                "how to",
                "definition",
            ],
            EssayType::Descriptive => &[
                "describe",
                "imagery",
                "sensory",
                "vivid",
                "details",
                "scene",
                "depict",
            ],
            EssayType::Persuasive => &[
                "persuade",
                "convince",
                "argument",
                "position",
                "appeal",
                "rhetoric",
                "call to action",
            ],
        }
    }

    /// Review criteria surfaced alongside an analysis of this type.
    pub fn criteria(self) -> &'static [&'static str] {
        match self {
            EssayType::Argumentative => &[
                "Clear thesis statement",
                "Strong evidence and examples",
                "Counterargument acknowledgment",
                "Logical flow of arguments",
                "Source credibility check",
            ],
            EssayType::Narrative => &[
                "Clear narrative arc",
                "Vivid imagery and descriptions",
                "Dialogue quality",
                "Character development",
                "Chronological flow",
            ],
            EssayType::Analytical => &[
                "Present tense usage",
                "Proper title italicization",
                "Quote integration",
                "Literary device identification",
                "Theme analysis depth",
            ],
            EssayType::Expository => &[
                "Clear explanations",
                "Logical organization",
                "Supporting details",
                "Objective tone",
                "Factual accuracy",
            ],
            EssayType::Descriptive => &[
                "Vivid sensory details",
                "Descriptive language",
                "Clear imagery",
                "Emotional impact",
                "Cohesive description",
            ],
            EssayType::Persuasive => &[
                "Clear position statement",
                "Persuasive techniques (ethos, pathos, logos)",
                "Strong evidence",
                "Call to action",
                "Audience engagement",
            ],
        }
    }

    pub fn allowed_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|t| t.display_name()).collect()
    }
}

impl fmt::Display for EssayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for EssayType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.display_name() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid essay type '{s}'. Allowed types: {}",
                    Self::allowed_names().join(", ")
                )
            })
    }
}

/// Picks the type whose keywords occur most often (substring match on lowercased text).
/// Text with no keyword hits at all is treated as expository.
pub fn classify(text: &str) -> EssayType {
    let lower = text.to_lowercase();

    let mut best = EssayType::Expository;
    let mut best_hits = 0;
    for essay_type in EssayType::ALL {
        let hits = essay_type
            .keywords()
            .iter()
            .filter(|keyword| lower.contains(*keyword))
            .count();
        if hits > best_hits {
            best = essay_type;
            best_hits = hits;
        }
    }
    best
}
