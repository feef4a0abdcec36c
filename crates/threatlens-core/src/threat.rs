//! Threat-intent profile extraction.
//!
//! [`extract_profile`] scans text for threat-category keywords, attacker
//! tactic keywords, and literal indicators (CVE ids, ATT&CK-style technique
//! codes) and returns a [`ThreatIntelProfile`]. Matching is case-insensitive
//! and word-boundary anchored; the category tables are fixed and iterated in
//! declaration order, so tag ordering is stable across runs. The function is
//! pure — identical input always yields a bit-identical profile.
//!
//! The same function serves documents, chunks, and queries.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::ThreatIntelProfile;

/// Threat category patterns, in declaration order.
const THREAT_PATTERNS: &[(&str, &str)] = &[
    ("ransomware", r"(?i)\bransomware\b"),
    ("phishing", r"(?i)\bphish(?:ing|ed|er)?\b"),
    ("supply_chain", r"(?i)\bsupply[ -]chain\b"),
    ("zero_day", r"(?i)\bzero[ -]day\b"),
    ("credential_theft", r"(?i)\bcredentials?\b|\bpasswords?\b"),
    ("cloud", r"(?i)\bcloud\b|\bcontainers?\b|\bkubernetes\b|\biam\b"),
    ("malware", r"(?i)\bmalware\b|\btrojans?\b|\bloaders?\b"),
    ("c2", r"(?i)\bcommand[ -]and[ -]control\b|\bc2\b"),
    ("vulnerability", r"(?i)\bcve-\d{4}-\d{4,}\b|\bvulnerabilit(?:y|ies)\b"),
];

/// Attacker tactic patterns, in declaration order.
const TACTIC_PATTERNS: &[(&str, &str)] = &[
    (
        "initial_access",
        r"(?i)\binitial access\b|\bspear[ -]?phishing\b|\bdrive[ -]by\b",
    ),
    (
        "execution",
        r"(?i)\bexecut(?:e|es|ed|ion)\b|\bpowershell\b|\bscript(?:ing)?\b",
    ),
    (
        "persistence",
        r"(?i)\bpersisten(?:ce|t)\b|\bscheduled task\b|\bregistry run\b",
    ),
    (
        "privilege_escalation",
        r"(?i)\bprivilege escalation\b|\bescalat(?:e|es|ed|ion)\b",
    ),
    (
        "defense_evasion",
        r"(?i)\bdefense evasion\b|\bevas(?:ion|ive)\b|\bobfuscat(?:e|ed|ion)\b",
    ),
    (
        "lateral_movement",
        r"(?i)\blateral movement\b|\bpass[ -]the[ -]hash\b|\bpivot(?:ing)?\b",
    ),
    (
        "exfiltration",
        r"(?i)\bexfiltrat(?:e|es|ed|ion)\b|\bdata staging\b|\bcollection\b",
    ),
];

static THREAT_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| compile_table(THREAT_PATTERNS));

static TACTIC_MATCHERS: LazyLock<Vec<(&'static str, Regex)>> =
    LazyLock::new(|| compile_table(TACTIC_PATTERNS));

static CVE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\bCVE-\d{4}-\d{4,}\b").unwrap());

static TECHNIQUE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bT\d{4}(?:\.\d{3})?\b").unwrap());

fn compile_table(table: &[(&'static str, &str)]) -> Vec<(&'static str, Regex)> {
    table
        .iter()
        .map(|(tag, pattern)| (*tag, Regex::new(pattern).unwrap()))
        .collect()
}

/// Extract a [`ThreatIntelProfile`] from arbitrary text.
///
/// A category is tagged iff its pattern matches anywhere in the text; tag
/// order follows table declaration order, not match position. Indicators
/// are uppercased, de-duplicated, and lexicographically sorted.
pub fn extract_profile(text: &str) -> ThreatIntelProfile {
    let tags = THREAT_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(tag, _)| tag.to_string())
        .collect();

    let tactics = TACTIC_MATCHERS
        .iter()
        .filter(|(_, re)| re.is_match(text))
        .map(|(tag, _)| tag.to_string())
        .collect();

    let mut indicators: BTreeSet<String> = BTreeSet::new();
    for m in CVE_RE.find_iter(text) {
        indicators.insert(m.as_str().to_uppercase());
    }
    for m in TECHNIQUE_RE.find_iter(text) {
        indicators.insert(m.as_str().to_uppercase());
    }

    ThreatIntelProfile {
        tags,
        tactics,
        indicators: indicators.into_iter().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ransomware_campaign_profile() {
        let text = "Ransomware campaign references CVE-2024-3400 and initial access via phishing";
        let profile = extract_profile(text);

        assert!(profile.tags.contains(&"ransomware".to_string()));
        assert!(profile.tags.contains(&"phishing".to_string()));
        assert!(profile.tags.contains(&"vulnerability".to_string()));
        assert!(profile.tactics.contains(&"initial_access".to_string()));
        assert!(profile.indicators.contains(&"CVE-2024-3400".to_string()));
    }

    #[test]
    fn test_tag_order_follows_table_declaration() {
        // "vulnerability" is declared after "ransomware" even though the CVE
        // appears first in the text.
        let text = "CVE-2023-1234 was weaponized by a ransomware crew";
        let profile = extract_profile(text);
        assert_eq!(profile.tags, vec!["ransomware", "vulnerability"]);
    }

    #[test]
    fn test_case_insensitive_matching() {
        let profile = extract_profile("RANSOMWARE operators spear-PHISHING a CLOUD tenant");
        assert!(profile.tags.contains(&"ransomware".to_string()));
        assert!(profile.tags.contains(&"phishing".to_string()));
        assert!(profile.tags.contains(&"cloud".to_string()));
        assert!(profile.tactics.contains(&"initial_access".to_string()));
    }

    #[test]
    fn test_indicators_sorted_and_deduplicated() {
        let text = "cve-2024-9999 then CVE-2024-0001, CVE-2024-9999 again, plus T1059.001 and t1059.001";
        let profile = extract_profile(text);
        assert_eq!(
            profile.indicators,
            vec!["CVE-2024-0001", "CVE-2024-9999", "T1059.001"]
        );
    }

    #[test]
    fn test_technique_code_without_subtechnique() {
        let profile = extract_profile("Observed T1566 activity against the fleet");
        assert_eq!(profile.indicators, vec!["T1566"]);
    }

    #[test]
    fn test_deterministic() {
        let text = "Zero-day in kubernetes IAM; lateral movement via pass-the-hash; exfiltration to C2";
        let a = extract_profile(text);
        let b = extract_profile(text);
        assert_eq!(a, b);
    }

    #[test]
    fn test_benign_text_is_empty() {
        let profile = extract_profile("Quarterly sales figures look great this year.");
        assert!(profile.is_empty());
    }

    #[test]
    fn test_word_boundaries_respected() {
        // "c2" must not match inside a longer alphanumeric run.
        let profile = extract_profile("The mac2000 printer driver");
        assert!(!profile.tags.contains(&"c2".to_string()));
    }
}
