//! Classification result models.

use serde::{Deserialize, Serialize};

use super::escalation::StaffTier;
use super::flag::{FlagCategory, Tier};

/// Action text shown when nothing in the corpus matched.
pub const NO_MATCH_ACTION: &str = "NO MATCH: escalate to Tier 2 triager for manual review";

/// Which side of the containment test fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Containment {
    /// The keyword appears inside the query
    KeywordInQuery,
    /// The whole query appears inside the keyword
    QueryInKeyword,
}

/// A corpus entry that matched a query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MatchedFlag {
    /// The matched entry, carried through unmodified
    pub flag: FlagCategory,
    /// First keyword (in declaration order) that fired
    pub matched_keyword: String,
    /// Direction of the containment match
    pub containment: Containment,
}

impl MatchedFlag {
    pub fn tier(&self) -> Tier {
        self.flag.tier()
    }

    pub fn id(&self) -> &str {
        self.flag.id()
    }

    pub fn action(&self) -> &str {
        self.flag.action()
    }
}

/// The single action the operator must see first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Action of the highest-priority match
    Matched {
        flag_id: String,
        tier: Tier,
        action: String,
    },
    /// Nothing matched; fall back to manual escalation
    NoMatch,
}

impl PrimaryAction {
    /// Text to render in the action banner.
    pub fn text(&self) -> &str {
        match self {
            PrimaryAction::Matched { action, .. } => action,
            PrimaryAction::NoMatch => NO_MATCH_ACTION,
        }
    }

    pub fn is_no_match(&self) -> bool {
        matches!(self, PrimaryAction::NoMatch)
    }
}

/// Routing derived from the top tier of a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Red flag: call 999 now
    Emergency,
    /// Amber flag: GP same-day review
    SameDayClinician,
    /// High-risk group: triager review
    TriagerReview,
    /// Pathway: reception follows the pathway action
    Signpost,
    /// Pharmacy First: reception signposts to pharmacy
    PharmacyFirst,
    /// No match: triager review by default
    ManualEscalation,
}

impl Disposition {
    /// Disposition for a classification whose top match has the given tier.
    pub fn for_top_tier(tier: Option<Tier>) -> Self {
        match tier {
            Some(Tier::Red) => Disposition::Emergency,
            Some(Tier::Amber) => Disposition::SameDayClinician,
            Some(Tier::HighRisk) => Disposition::TriagerReview,
            Some(Tier::Pathway) => Disposition::Signpost,
            Some(Tier::PharmacyFirst) => Disposition::PharmacyFirst,
            None => Disposition::ManualEscalation,
        }
    }

    /// Staff tier that should own the case. `None` for emergencies, which
    /// are handed off to 999 immediately.
    pub fn owning_tier(self) -> Option<StaffTier> {
        match self {
            Disposition::Emergency => None,
            Disposition::SameDayClinician => Some(StaffTier::Gp),
            Disposition::TriagerReview | Disposition::ManualEscalation => {
                Some(StaffTier::Triager)
            }
            Disposition::Signpost | Disposition::PharmacyFirst => Some(StaffTier::Reception),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Emergency => "emergency",
            Disposition::SameDayClinician => "same_day_clinician",
            Disposition::TriagerReview => "triager_review",
            Disposition::Signpost => "signpost",
            Disposition::PharmacyFirst => "pharmacy_first",
            Disposition::ManualEscalation => "manual_escalation",
        }
    }
}

/// Output of a single classification pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClassificationResult {
    /// Query after lowercasing and whitespace collapsing
    pub normalized_query: String,
    /// Version of the corpus snapshot used
    pub corpus_version: String,
    /// Matches ranked by tier, then declaration order
    pub matches: Vec<MatchedFlag>,
    /// Action of the first match, or the no-match sentinel
    pub primary_action: PrimaryAction,
}

impl ClassificationResult {
    pub fn is_match(&self) -> bool {
        !self.matches.is_empty()
    }

    pub fn has_red_flag(&self) -> bool {
        self.matches.iter().any(|m| m.tier() == Tier::Red)
    }

    pub fn top_tier(&self) -> Option<Tier> {
        self.matches.first().map(|m| m.tier())
    }

    /// Matched ids in ranked order.
    pub fn matched_ids(&self) -> Vec<String> {
        self.matches.iter().map(|m| m.id().to_string()).collect()
    }

    /// Everything after the primary match.
    pub fn secondary_matches(&self) -> &[MatchedFlag] {
        self.matches.get(1..).unwrap_or(&[])
    }

    pub fn disposition(&self) -> Disposition {
        Disposition::for_top_tier(self.top_tier())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disposition_routing() {
        assert_eq!(
            Disposition::for_top_tier(Some(Tier::Red)),
            Disposition::Emergency
        );
        assert_eq!(Disposition::Emergency.owning_tier(), None);
        assert_eq!(
            Disposition::for_top_tier(Some(Tier::Amber)).owning_tier(),
            Some(StaffTier::Gp)
        );
        assert_eq!(
            Disposition::for_top_tier(None).owning_tier(),
            Some(StaffTier::Triager)
        );
        assert_eq!(
            Disposition::for_top_tier(Some(Tier::PharmacyFirst)).owning_tier(),
            Some(StaffTier::Reception)
        );
    }

    #[test]
    fn test_no_match_sentinel() {
        let result = ClassificationResult {
            normalized_query: String::new(),
            corpus_version: "test".into(),
            matches: vec![],
            primary_action: PrimaryAction::NoMatch,
        };

        assert!(!result.is_match());
        assert!(result.secondary_matches().is_empty());
        assert_eq!(result.primary_action.text(), NO_MATCH_ACTION);
        assert_eq!(result.disposition(), Disposition::ManualEscalation);
    }
}
