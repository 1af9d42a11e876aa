//! Built-in reception triage protocol.
//!
//! Declaration order inside each tier is the clinical priority order agreed
//! by the practice's clinical lead. Keep new entries below the ones they
//! are less urgent than.

use crate::models::{
    AmberFlag, FlagBase, FlagCategory, HighRiskGroup, Pathway, PharmacyFirstCondition, RedFlag,
};

use super::{normalize_entry, Corpus};

/// Protocol version of the built-in corpus.
pub const BUILTIN_VERSION: &str = "gp-reception-2025.1";

const CALL_999: &str = "CALL 999 NOW";
const SAME_DAY: &str = "GP Triager - Same Day";
const HIGH_RISK: &str = "Lower threshold: pass to Tier 2 triager before booking";
const PHARMACY_FIRST: &str = "Refer to Pharmacy First (community pharmacist consultation)";

fn base(id: &str, keywords: &[&str], description: &str, action: &str) -> FlagBase {
    FlagBase {
        id: id.to_string(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        description: description.to_string(),
        action: action.to_string(),
    }
}

fn red(id: &str, keywords: &[&str], description: &str, category: &str, nice_ref: Option<&str>) -> FlagCategory {
    FlagCategory::RedFlag(RedFlag {
        base: base(id, keywords, description, CALL_999),
        category: Some(category.to_string()),
        nice_ref: nice_ref.map(str::to_string),
    })
}

fn amber(id: &str, keywords: &[&str], description: &str, category: &str, nice_ref: Option<&str>) -> FlagCategory {
    FlagCategory::AmberFlag(AmberFlag {
        base: base(id, keywords, description, SAME_DAY),
        category: Some(category.to_string()),
        nice_ref: nice_ref.map(str::to_string),
    })
}

fn high_risk(id: &str, keywords: &[&str], description: &str, category: &str) -> FlagCategory {
    FlagCategory::HighRiskGroup(HighRiskGroup {
        base: base(id, keywords, description, HIGH_RISK),
        category: Some(category.to_string()),
    })
}

fn pathway(id: &str, keywords: &[&str], description: &str, action: &str, service: &str) -> FlagCategory {
    FlagCategory::Pathway(Pathway {
        base: base(id, keywords, description, action),
        service: Some(service.to_string()),
    })
}

fn pharmacy(id: &str, keywords: &[&str], description: &str, age_range: &str, exclusions: &[&str]) -> FlagCategory {
    FlagCategory::PharmacyFirstCondition(PharmacyFirstCondition {
        base: base(id, keywords, description, PHARMACY_FIRST),
        age_range: Some(age_range.to_string()),
        exclusions: exclusions.iter().map(|e| e.to_string()).collect(),
    })
}

fn red_flags() -> Vec<FlagCategory> {
    vec![
        red(
            "chest-pain",
            &["chest pain", "crushing chest", "chest tightness", "pain spreading to my jaw"],
            "Possible acute coronary syndrome",
            "cardiac",
            Some("NICE CG95"),
        ),
        red(
            "breathing-difficulty",
            &["can't breathe", "cannot breathe", "struggling to breathe", "blue lips", "can't finish sentences"],
            "Severe breathlessness or cyanosis",
            "respiratory",
            None,
        ),
        red(
            "stroke",
            &["stroke", "slurred speech", "face drooping", "arm weakness", "sudden weakness on one side"],
            "Possible stroke (FAST positive)",
            "neurological",
            Some("NICE NG128"),
        ),
        red(
            "headache-severe",
            &["worst headache of my life", "thunderclap headache", "sudden severe headache", "headache with stiff neck"],
            "Possible subarachnoid haemorrhage or meningitis",
            "neurological",
            Some("NICE CG150"),
        ),
        red(
            "unresponsive",
            &["unconscious", "unresponsive", "not breathing", "collapsed"],
            "Reduced consciousness or collapse",
            "general",
            None,
        ),
        red(
            "anaphylaxis",
            &["anaphylaxis", "throat swelling", "swollen tongue", "severe allergic reaction"],
            "Possible anaphylaxis",
            "allergy",
            Some("NICE CG134"),
        ),
        red(
            "sepsis",
            &["sepsis", "mottled skin", "non-blanching rash", "not passed urine all day"],
            "Possible sepsis",
            "general",
            Some("NICE NG51"),
        ),
        red(
            "seizure",
            &["seizure", "convulsion", "fitting now"],
            "Ongoing or first seizure",
            "neurological",
            None,
        ),
        red(
            "major-bleeding",
            &["heavy bleeding", "won't stop bleeding", "vomiting blood", "coughing up blood"],
            "Major haemorrhage",
            "general",
            None,
        ),
        red(
            "testicular-torsion",
            &["testicle pain", "sudden testicular pain"],
            "Possible testicular torsion",
            "urological",
            None,
        ),
        red(
            "overdose",
            &["overdose", "suicide attempt"],
            "Overdose or attempted suicide",
            "mental health",
            None,
        ),
    ]
}

fn amber_flags() -> Vec<FlagCategory> {
    vec![
        amber(
            "abdominal-pain-severe",
            &["severe abdominal pain", "severe tummy pain", "abdominal pain and vomiting"],
            "Severe abdominal pain needing same-day assessment",
            "gastrointestinal",
            None,
        ),
        amber(
            "febrile-child",
            &["baby with a temperature", "child with a high temperature", "fever not coming down"],
            "Febrile child (traffic-light amber)",
            "paediatric",
            Some("NICE NG143"),
        ),
        amber(
            "dehydration",
            &["not drinking", "no wet nappies", "dry nappies"],
            "Possible dehydration",
            "paediatric",
            None,
        ),
        amber(
            "worsening-asthma",
            &["asthma getting worse", "inhaler not helping", "wheezy"],
            "Asthma not controlled by usual treatment",
            "respiratory",
            Some("NICE NG80"),
        ),
        amber(
            "urinary-retention",
            &["can't pass urine", "unable to pass urine"],
            "Possible urinary retention",
            "urological",
            None,
        ),
        amber(
            "testicular-symptoms",
            &["testicle pain", "testicle lump", "scrotal swelling"],
            "Testicular symptoms not meeting the torsion flag",
            "urological",
            None,
        ),
        amber(
            "red-eye",
            &["painful red eye", "blurred vision"],
            "Painful red eye or new visual disturbance",
            "ophthalmic",
            None,
        ),
        amber(
            "rash-fever",
            &["rash with fever", "rash and fever"],
            "Rash with fever",
            "dermatological",
            None,
        ),
        amber(
            "new-lump",
            &["new lump", "breast lump"],
            "New lump (suspected cancer pathway review)",
            "oncology",
            Some("NICE NG12"),
        ),
    ]
}

fn high_risk_groups() -> Vec<FlagCategory> {
    vec![
        high_risk(
            "pregnancy",
            &["pregnant", "pregnancy", "weeks gestation", "just had a baby"],
            "Pregnant or postnatal",
            "obstetric",
        ),
        high_risk(
            "immunosuppressed",
            &["chemotherapy", "immunosuppressed", "transplant", "on steroids"],
            "Immunosuppressed patient",
            "immunology",
        ),
        high_risk(
            "young-infant",
            &["newborn", "under 3 months"],
            "Infant under three months",
            "paediatric",
        ),
        high_risk(
            "frailty",
            &["care home", "housebound", "dementia", "frail"],
            "Frail or care-home resident",
            "older people",
        ),
        high_risk(
            "diabetes",
            &["diabetic", "diabetes"],
            "Diabetes (risk of rapid deterioration)",
            "endocrine",
        ),
    ]
}

fn pathways() -> Vec<FlagCategory> {
    vec![
        pathway(
            "mental-health-crisis",
            &["suicidal", "self harm", "self-harm", "panic attack"],
            "Mental health crisis without immediate danger",
            "Warm transfer to the mental health crisis line; stay on the call",
            "Mental health crisis team",
        ),
        pathway(
            "dental",
            &["toothache", "dental abscess", "broken tooth"],
            "Dental problem",
            "Signpost to own dentist or NHS 111 for urgent dental care",
            "NHS urgent dental service",
        ),
        pathway(
            "minor-injury",
            &["sprained", "twisted ankle", "minor burn", "cut finger"],
            "Minor injury",
            "Signpost to the local urgent treatment centre",
            "Urgent treatment centre",
        ),
        pathway(
            "sexual-health",
            &["sexual health", "morning after pill", "emergency contraception"],
            "Sexual health or emergency contraception",
            "Signpost to sexual health clinic or community pharmacy",
            "Sexual health clinic",
        ),
        pathway(
            "admin-request",
            &["fit note", "sick note", "repeat prescription"],
            "Administrative request",
            "Pass to the practice admin team",
            "Practice admin team",
        ),
    ]
}

fn pharmacy_first_conditions() -> Vec<FlagCategory> {
    vec![
        pharmacy(
            "sinusitis",
            &["sinusitis", "sinus pain", "blocked sinuses"],
            "Acute sinusitis",
            "12 years and over",
            &["symptoms over 12 weeks", "swelling around the eye"],
        ),
        pharmacy(
            "sore-throat",
            &["sore throat", "tonsillitis", "painful swallowing"],
            "Acute sore throat",
            "5 years and over",
            &["drooling", "stridor", "immunosuppressed"],
        ),
        pharmacy(
            "acute-otitis-media",
            &["earache", "ear ache", "ear infection"],
            "Acute otitis media",
            "1 to 17 years",
            &["discharge after recent perforation", "over 18"],
        ),
        pharmacy(
            "infected-insect-bite",
            &["insect bite", "infected bite"],
            "Infected insect bite",
            "1 year and over",
            &["bite from a person or animal", "systemic symptoms"],
        ),
        pharmacy(
            "impetigo",
            &["impetigo", "crusty sores"],
            "Impetigo",
            "1 year and over",
            &["bullous impetigo", "recurrent impetigo"],
        ),
        pharmacy(
            "shingles",
            &["shingles", "blistering rash on one side"],
            "Shingles",
            "18 years and over",
            &["pregnant", "immunosuppressed", "rash near the eye"],
        ),
        pharmacy(
            "uncomplicated-uti",
            &["uti", "cystitis", "burning when i pee", "stinging when passing urine"],
            "Uncomplicated urinary tract infection in women",
            "Women 16 to 64 years",
            &["male", "pregnant", "catheter", "fever or loin pain"],
        ),
    ]
}

/// Assemble the built-in corpus.
///
/// Built directly rather than through [`Corpus::new`] because the data is
/// static; `test_builtin_is_valid` guards it against validation drift.
pub(super) fn builtin_corpus() -> Corpus {
    let entries = red_flags()
        .into_iter()
        .chain(amber_flags())
        .chain(high_risk_groups())
        .chain(pathways())
        .chain(pharmacy_first_conditions())
        .map(normalize_entry)
        .collect();

    Corpus {
        version: BUILTIN_VERSION.to_string(),
        entries,
    }
}
