//! Rule-based style check of a generated reply against the active profile.
//!
//! No model calls. Issues are advisory data; a low score never blocks a reply.

use doppel_core::profile::PersonalityProfile;
use serde::{Deserialize, Serialize};

pub const TOO_FORMAL: &str = "Response too formal for profile's casual style";
pub const TOO_CASUAL: &str = "Response too casual for profile's formal style";
pub const META_COMMENTARY: &str =
    "Contains meta-commentary (should BE the person, not describe them)";
pub const EXCESSIVE_HUMOR: &str = "Excessive humor doesn't match profile's serious tone";
pub const TOO_UNIFORM: &str = "Sentences too uniform - profile indicates varied rhythm";
pub const TOO_VARIED: &str = "Sentences too varied - profile indicates uniform rhythm";

/// Word lists and thresholds used by [`ResponseValidator`].
#[derive(Debug, Clone)]
pub struct ValidatorRules {
    pub formal_words: Vec<String>,
    pub casual_words: Vec<String>,
    pub formal_markers: Vec<String>,
    pub casual_markers: Vec<String>,
    /// Register mismatch needs strictly more hits than this.
    pub register_hit_limit: usize,
    pub serious_tone_markers: Vec<String>,
    pub humor_indicators: Vec<String>,
    pub humor_hit_limit: usize,
    /// Rhythm is only judged above this many sentences.
    pub min_sentences_for_rhythm: usize,
    pub varied_markers: Vec<String>,
    pub uniform_markers: Vec<String>,
    pub min_varied_range: usize,
    pub max_uniform_range: usize,
    pub issue_penalty: f32,
    pub style_base: f32,
    pub signature_bonus: f32,
    pub clean_bonus: f32,
    pub signature_phrase_limit: usize,
    pub valid_threshold: f32,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Default for ValidatorRules {
    fn default() -> Self {
        Self {
            formal_words: words(&["furthermore", "moreover", "consequently", "therefore", "thus"]),
            casual_words: words(&["gonna", "wanna", "yeah", "kinda", "sorta", "btw"]),
            formal_markers: words(&["formal", "professional", "academic"]),
            casual_markers: words(&["casual", "informal", "relaxed"]),
            register_hit_limit: 2,
            serious_tone_markers: words(&["serious", "professional"]),
            humor_indicators: words(&["lol", "haha", "😂", "😄", "rofl", "lmao"]),
            humor_hit_limit: 2,
            min_sentences_for_rhythm: 3,
            varied_markers: words(&["varied", "rhythmic"]),
            uniform_markers: words(&["uniform"]),
            min_varied_range: 3,
            max_uniform_range: 10,
            issue_penalty: 0.15,
            style_base: 0.75,
            signature_bonus: 0.15,
            clean_bonus: 0.10,
            signature_phrase_limit: 10,
            valid_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub confidence_score: f32,
    pub style_match: f32,
    pub issues: Vec<String>,
    pub is_valid: bool,
}

pub struct ResponseValidator<'a> {
    profile: &'a PersonalityProfile,
    meta_phrases: Vec<String>,
    rules: ValidatorRules,
}

impl<'a> ResponseValidator<'a> {
    pub fn new(profile: &'a PersonalityProfile, persona_name: &str) -> Self {
        Self::with_rules(profile, persona_name, ValidatorRules::default())
    }

    pub fn with_rules(
        profile: &'a PersonalityProfile,
        persona_name: &str,
        rules: ValidatorRules,
    ) -> Self {
        Self {
            profile,
            meta_phrases: meta_phrases(persona_name),
            rules,
        }
    }

    pub fn validate(&self, response: &str) -> ValidationReport {
        let rules = &self.rules;
        let style = &self.profile.writing_style;
        let lower = response.to_lowercase();
        let mut issues = Vec::new();

        let formality = style.tonal_range.formality_spectrum.to_lowercase();
        let formal_hits = presence_count(&lower, &rules.formal_words);
        let casual_hits = presence_count(&lower, &rules.casual_words);
        let expects_formal = contains_any(&formality, &rules.formal_markers);
        let expects_casual = contains_any(&formality, &rules.casual_markers);
        if expects_casual && formal_hits > rules.register_hit_limit {
            issues.push(TOO_FORMAL.to_string());
        } else if expects_formal && casual_hits > rules.register_hit_limit {
            issues.push(TOO_CASUAL.to_string());
        }

        if contains_any(&lower, &self.meta_phrases) {
            issues.push(META_COMMENTARY.to_string());
        }

        let tone = style.tonal_range.default_tone.to_lowercase();
        if contains_any(&tone, &rules.serious_tone_markers)
            && presence_count(&lower, &rules.humor_indicators) > rules.humor_hit_limit
        {
            issues.push(EXCESSIVE_HUMOR.to_string());
        }

        if let Some(issue) = self.rhythm_issue(response) {
            issues.push(issue.to_string());
        }

        let has_signature = style
            .stylistic_markers
            .signature_phrases
            .iter()
            .take(rules.signature_phrase_limit)
            .any(|p| lower.contains(&p.to_lowercase()));

        let confidence_score =
            (1.0 - rules.issue_penalty * issues.len() as f32).clamp(0.0, 1.0);
        let mut style_match = rules.style_base;
        if has_signature {
            style_match += rules.signature_bonus;
        }
        if issues.is_empty() {
            style_match += rules.clean_bonus;
        }

        ValidationReport {
            confidence_score,
            style_match: style_match.min(1.0),
            is_valid: confidence_score > rules.valid_threshold,
            issues,
        }
    }

    fn rhythm_issue(&self, response: &str) -> Option<&'static str> {
        let lengths: Vec<usize> = response
            .split(['.', '!', '?'])
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.split_whitespace().count())
            .collect();
        if lengths.len() <= self.rules.min_sentences_for_rhythm {
            return None;
        }
        let range = lengths.iter().max()? - lengths.iter().min()?;

        let variation = self.profile.writing_style.rhythm.sentence_variation.to_lowercase();
        if contains_any(&variation, &self.rules.varied_markers) {
            (range < self.rules.min_varied_range).then_some(TOO_UNIFORM)
        } else if contains_any(&variation, &self.rules.uniform_markers) {
            (range > self.rules.max_uniform_range).then_some(TOO_VARIED)
        } else {
            None
        }
    }
}

/// Third-person self-references that betray the persona.
fn meta_phrases(name: &str) -> Vec<String> {
    let name = name.to_lowercase();
    vec![
        format!("{name} would"),
        format!("as {name}"),
        format!("{name} thinks"),
        format!("{name} believes"),
        format!("speaking as {name}"),
        format!("in {name}'s style"),
    ]
}

fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

/// Number of distinct list entries present in `haystack`.
fn presence_count(haystack: &str, needles: &[String]) -> usize {
    needles.iter().filter(|n| haystack.contains(n.as_str())).count()
}
