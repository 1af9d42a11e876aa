//! Flag category models for the triage corpus.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Priority tier of a flag category.
///
/// Ordering is by clinical priority (`Red` is the greatest), not by the
/// order entries happen to be declared in a corpus file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Emergency: call 999
    Red,
    /// Same-day clinician review
    Amber,
    /// Patient group with a lowered escalation threshold
    HighRisk,
    /// Local service pathway
    Pathway,
    /// Pharmacist-led care
    PharmacyFirst,
}

impl Tier {
    /// All tiers, highest priority first.
    pub const ALL: [Tier; 5] = [
        Tier::Red,
        Tier::Amber,
        Tier::HighRisk,
        Tier::Pathway,
        Tier::PharmacyFirst,
    ];

    /// Rank used for sorting. Lower rank is more urgent.
    pub fn rank(self) -> u8 {
        match self {
            Tier::Red => 0,
            Tier::Amber => 1,
            Tier::HighRisk => 2,
            Tier::Pathway => 3,
            Tier::PharmacyFirst => 4,
        }
    }

    /// Short label for display and audit output.
    pub fn label(self) -> &'static str {
        match self {
            Tier::Red => "red_flag",
            Tier::Amber => "amber_flag",
            Tier::HighRisk => "high_risk_group",
            Tier::Pathway => "pathway",
            Tier::PharmacyFirst => "pharmacy_first",
        }
    }
}

impl Ord for Tier {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so that `Red > Amber > ... > PharmacyFirst`.
        other.rank().cmp(&self.rank())
    }
}

impl PartialOrd for Tier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields shared by every flag category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlagBase {
    /// Stable unique identifier
    pub id: String,
    /// Lowercase phrases used for containment matching
    pub keywords: Vec<String>,
    /// Human-readable explanation of the clinical concern
    #[serde(default)]
    pub description: String,
    /// Prescribed next step (e.g., "CALL 999 NOW")
    #[serde(default)]
    pub action: String,
}

impl FlagBase {
    /// Create a base record with required fields.
    pub fn new(id: String, action: String) -> Self {
        Self {
            id,
            keywords: Vec::new(),
            description: String::new(),
            action,
        }
    }
}

/// Emergency symptom pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RedFlag {
    #[serde(flatten)]
    pub base: FlagBase,
    /// Body system or grouping tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Guideline citation (e.g., "NICE CG95")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nice_ref: Option<String>,
}

/// Same-day review symptom pattern.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AmberFlag {
    #[serde(flatten)]
    pub base: FlagBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nice_ref: Option<String>,
}

/// Patient population with a lowered escalation threshold.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HighRiskGroup {
    #[serde(flatten)]
    pub base: FlagBase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Minor condition eligible for the Pharmacy First service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PharmacyFirstCondition {
    #[serde(flatten)]
    pub base: FlagBase,
    /// Eligible age band (e.g., "5 years and over")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    /// Presentations that exclude the pharmacy route
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclusions: Vec<String>,
}

/// Signposting pathway to another service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pathway {
    #[serde(flatten)]
    pub base: FlagBase,
    /// Receiving service name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

/// A single corpus entry, tagged with its tier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "tier", rename_all = "snake_case")]
pub enum FlagCategory {
    RedFlag(RedFlag),
    AmberFlag(AmberFlag),
    HighRiskGroup(HighRiskGroup),
    PharmacyFirstCondition(PharmacyFirstCondition),
    Pathway(Pathway),
}

impl FlagCategory {
    /// Build a category of the given tier with no tier-specific fields set.
    pub fn new(tier: Tier, base: FlagBase) -> Self {
        match tier {
            Tier::Red => FlagCategory::RedFlag(RedFlag {
                base,
                category: None,
                nice_ref: None,
            }),
            Tier::Amber => FlagCategory::AmberFlag(AmberFlag {
                base,
                category: None,
                nice_ref: None,
            }),
            Tier::HighRisk => FlagCategory::HighRiskGroup(HighRiskGroup {
                base,
                category: None,
            }),
            Tier::Pathway => FlagCategory::Pathway(Pathway {
                base,
                service: None,
            }),
            Tier::PharmacyFirst => {
                FlagCategory::PharmacyFirstCondition(PharmacyFirstCondition {
                    base,
                    age_range: None,
                    exclusions: Vec::new(),
                })
            }
        }
    }

    pub fn tier(&self) -> Tier {
        match self {
            FlagCategory::RedFlag(_) => Tier::Red,
            FlagCategory::AmberFlag(_) => Tier::Amber,
            FlagCategory::HighRiskGroup(_) => Tier::HighRisk,
            FlagCategory::PharmacyFirstCondition(_) => Tier::PharmacyFirst,
            FlagCategory::Pathway(_) => Tier::Pathway,
        }
    }

    pub fn base(&self) -> &FlagBase {
        match self {
            FlagCategory::RedFlag(f) => &f.base,
            FlagCategory::AmberFlag(f) => &f.base,
            FlagCategory::HighRiskGroup(f) => &f.base,
            FlagCategory::PharmacyFirstCondition(f) => &f.base,
            FlagCategory::Pathway(f) => &f.base,
        }
    }

    pub(crate) fn base_mut(&mut self) -> &mut FlagBase {
        match self {
            FlagCategory::RedFlag(f) => &mut f.base,
            FlagCategory::AmberFlag(f) => &mut f.base,
            FlagCategory::HighRiskGroup(f) => &mut f.base,
            FlagCategory::PharmacyFirstCondition(f) => &mut f.base,
            FlagCategory::Pathway(f) => &mut f.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn keywords(&self) -> &[String] {
        &self.base().keywords
    }

    pub fn description(&self) -> &str {
        &self.base().description
    }

    pub fn action(&self) -> &str {
        &self.base().action
    }

    /// Guideline citation, for tiers that carry one.
    pub fn nice_ref(&self) -> Option<&str> {
        match self {
            FlagCategory::RedFlag(f) => f.nice_ref.as_deref(),
            FlagCategory::AmberFlag(f) => f.nice_ref.as_deref(),
            _ => None,
        }
    }
}
