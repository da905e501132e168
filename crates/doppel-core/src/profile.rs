//! Personality profile: six independently scored dimensions plus the
//! synthesis fields that tie them together.
//!
//! Every record is decoded with schema defaults. Missing or `null` fields
//! fall back to `"Unknown"`-style text, empty collections and a confidence
//! of 0.5, so a sparse model answer still yields a complete profile. Only a
//! payload that is not an object, or whose present fields have the wrong
//! shape, is rejected.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const DEFAULT_CONFIDENCE: f32 = 0.5;
const UNKNOWN: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Unknown dimension: {0}")]
    UnknownDimension(String),

    #[error("{subject}: expected a JSON object")]
    NotAnObject { subject: String },

    #[error("{subject}: {reason}")]
    Invalid { subject: String, reason: String },
}

// ── Dimensions ──────────────────────────────────────────────────────────

/// One facet of personality analyzed on its own. Ordering is the fixed
/// extraction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    WritingStyle,
    Cognitive,
    Emotional,
    Interests,
    Worldview,
    Social,
}

impl Dimension {
    pub const ALL: [Dimension; 6] = [
        Self::WritingStyle,
        Self::Cognitive,
        Self::Emotional,
        Self::Interests,
        Self::Worldview,
        Self::Social,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::WritingStyle => "writing_style",
            Self::Cognitive => "cognitive",
            Self::Emotional => "emotional",
            Self::Interests => "interests",
            Self::Worldview => "worldview",
            Self::Social => "social",
        }
    }

    /// Human-readable label used in progress reports.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::WritingStyle => "Writing Style",
            Self::Cognitive => "Cognitive Patterns",
            Self::Emotional => "Emotional Patterns",
            Self::Interests => "Interests & Desires",
            Self::Worldview => "Worldview & Beliefs",
            Self::Social => "Social Dynamics",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dimension {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.key() == s)
            .ok_or_else(|| ProfileError::UnknownDimension(s.to_string()))
    }
}

/// Raw per-dimension extraction output, keyed in extraction order.
pub type RawAnalyses = BTreeMap<Dimension, Value>;

// ── Decoding helpers ────────────────────────────────────────────────────

/// Parse a 0..1 score leniently: numbers are clamped, numeric strings are
/// parsed, anything else falls back to 0.5.
fn unit_interval<'de, D>(deserializer: D) -> Result<f32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value))
}

fn score_from_value(value: &Value) -> f32 {
    let raw = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match raw {
        Some(x) if x.is_finite() => x.clamp(0.0, 1.0) as f32,
        _ => DEFAULT_CONFIDENCE,
    }
}

fn unit_interval_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(k, v)| (k, score_from_value(&v)))
        .collect())
}

fn optional_unit_interval<'de, D>(deserializer: D) -> Result<Option<f32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_null()).map(|v| score_from_value(&v)))
}

fn interest_list<'de, D>(deserializer: D) -> Result<Vec<Interest>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Entry {
        Detailed(Interest),
        Topic(String),
    }

    let entries = Vec::<Entry>::deserialize(deserializer)?;
    Ok(entries
        .into_iter()
        .map(|e| match e {
            Entry::Detailed(i) => i,
            Entry::Topic(topic) => Interest {
                topic,
                ..Interest::default()
            },
        })
        .collect())
}

fn prune_nulls(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.retain(|_, v| !v.is_null());
            map.values_mut().for_each(prune_nulls);
        }
        Value::Array(items) => {
            items.retain(|v| !v.is_null());
            items.iter_mut().for_each(prune_nulls);
        }
        _ => {}
    }
}

/// Merge a JSON object over a record's defaults.
///
/// `subject` names the payload in errors (a dimension key, or `synthesis`).
pub fn decode_with_defaults<T>(subject: &str, raw: &Value) -> Result<T, ProfileError>
where
    T: DeserializeOwned + Default,
{
    if !raw.is_object() {
        return Err(ProfileError::NotAnObject {
            subject: subject.to_string(),
        });
    }
    let mut value = raw.clone();
    prune_nulls(&mut value);
    serde_json::from_value(value).map_err(|e| ProfileError::Invalid {
        subject: subject.to_string(),
        reason: e.to_string(),
    })
}

fn unknown() -> String {
    UNKNOWN.to_string()
}

// ── Writing style ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmPattern {
    pub pacing_description: String,
    pub sentence_variation: String,
    pub paragraph_style: String,
    pub flow_characteristics: Vec<String>,
}

impl Default for RhythmPattern {
    fn default() -> Self {
        Self {
            pacing_description: "Unable to determine".into(),
            sentence_variation: unknown(),
            paragraph_style: unknown(),
            flow_characteristics: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylisticMarkers {
    pub signature_phrases: Vec<String>,
    pub metaphor_patterns: Vec<String>,
    pub transition_style: String,
    pub emphasis_patterns: Vec<String>,
    pub punctuation_habits: String,
}

impl Default for StylisticMarkers {
    fn default() -> Self {
        Self {
            signature_phrases: Vec::new(),
            metaphor_patterns: Vec::new(),
            transition_style: unknown(),
            emphasis_patterns: Vec::new(),
            punctuation_habits: "Standard".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TonalRange {
    pub default_tone: String,
    pub tonal_shifts: BTreeMap<String, String>,
    pub emotional_coloring: String,
    pub formality_spectrum: String,
}

impl Default for TonalRange {
    fn default() -> Self {
        Self {
            default_tone: "Neutral".into(),
            tonal_shifts: BTreeMap::new(),
            emotional_coloring: unknown(),
            formality_spectrum: unknown(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WritingStyleProfile {
    pub rhythm: RhythmPattern,
    pub stylistic_markers: StylisticMarkers,
    pub tonal_range: TonalRange,
    pub linguistic_fingerprints: Vec<String>,
    pub vocabulary_character: String,
    pub voice_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for WritingStyleProfile {
    fn default() -> Self {
        Self {
            rhythm: RhythmPattern::default(),
            stylistic_markers: StylisticMarkers::default(),
            tonal_range: TonalRange::default(),
            linguistic_fingerprints: Vec::new(),
            vocabulary_character: unknown(),
            voice_description: "Unable to determine writing voice".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Cognitive ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningPatterns {
    /// deductive / inductive / abductive / mixed, as the model phrased it.
    pub primary_mode: String,
    pub logical_style: String,
    pub evidence_preference: String,
    pub abstraction_level: String,
}

impl Default for ReasoningPatterns {
    fn default() -> Self {
        Self {
            primary_mode: "Mixed".into(),
            logical_style: unknown(),
            evidence_preference: unknown(),
            abstraction_level: unknown(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentalModels {
    pub identified_frameworks: Vec<String>,
    pub implicit_models: Vec<String>,
    pub analogical_sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CognitiveProfile {
    pub reasoning_patterns: ReasoningPatterns,
    pub mental_models: MentalModels,
    pub problem_solving_style: String,
    pub idea_connection_style: String,
    pub learning_approach: String,
    pub complexity_preference: String,
    pub thinking_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for CognitiveProfile {
    fn default() -> Self {
        Self {
            reasoning_patterns: ReasoningPatterns::default(),
            mental_models: MentalModels::default(),
            problem_solving_style: unknown(),
            idea_connection_style: unknown(),
            learning_approach: unknown(),
            complexity_preference: unknown(),
            thinking_description: "Unable to determine thinking patterns".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Emotional ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalTriggers {
    pub excites: Vec<String>,
    pub frustrates: Vec<String>,
    pub motivates: Vec<String>,
    pub calms: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PassionMap {
    pub high_passion: Vec<String>,
    pub moderate_interest: Vec<String>,
    pub emerging_curiosity: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmotionalProfile {
    pub triggers: EmotionalTriggers,
    pub passion_map: PassionMap,
    pub expression_patterns: String,
    pub emotional_vocabulary: Vec<String>,
    pub values_from_emotion: Vec<String>,
    pub emotional_baseline: String,
    pub emotional_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for EmotionalProfile {
    fn default() -> Self {
        Self {
            triggers: EmotionalTriggers::default(),
            passion_map: PassionMap::default(),
            expression_patterns: unknown(),
            emotional_vocabulary: Vec::new(),
            values_from_emotion: Vec::new(),
            emotional_baseline: unknown(),
            emotional_description: "Unable to determine emotional patterns".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Interests ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Interest {
    pub topic: String,
    #[serde(deserialize_with = "unit_interval")]
    pub depth: f32,
    pub evidence: Vec<String>,
    pub context: String,
}

impl Default for Interest {
    fn default() -> Self {
        Self {
            topic: unknown(),
            depth: DEFAULT_CONFIDENCE,
            evidence: Vec::new(),
            context: unknown(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterestProfile {
    /// Bare strings in the model output become interests of depth 0.5.
    #[serde(deserialize_with = "interest_list")]
    pub genuine_interests: Vec<Interest>,
    pub curiosities: Vec<String>,
    pub aspirations: Vec<String>,
    #[serde(deserialize_with = "unit_interval_map")]
    pub topic_affinities: BTreeMap<String, f32>,
    pub learning_trajectories: Vec<String>,
    pub interest_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for InterestProfile {
    fn default() -> Self {
        Self {
            genuine_interests: Vec::new(),
            curiosities: Vec::new(),
            aspirations: Vec::new(),
            topic_affinities: BTreeMap::new(),
            learning_trajectories: Vec::new(),
            interest_description: "Unable to determine interests".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Worldview ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreBeliefs {
    pub explicit_beliefs: Vec<String>,
    pub implicit_assumptions: Vec<String>,
    /// Highest priority first.
    pub values_hierarchy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldviewProfile {
    pub core_beliefs: CoreBeliefs,
    pub philosophical_leanings: Vec<String>,
    pub framing_patterns: String,
    pub unique_perspectives: Vec<String>,
    pub domain_lenses: BTreeMap<String, String>,
    pub epistemology: String,
    pub worldview_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for WorldviewProfile {
    fn default() -> Self {
        Self {
            core_beliefs: CoreBeliefs::default(),
            philosophical_leanings: Vec::new(),
            framing_patterns: unknown(),
            unique_perspectives: Vec::new(),
            domain_lenses: BTreeMap::new(),
            epistemology: unknown(),
            worldview_description: "Unable to determine worldview".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Social ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationDynamics {
    pub initiation_style: String,
    pub response_patterns: String,
    pub engagement_depth: String,
    pub directness_level: String,
}

impl Default for CommunicationDynamics {
    fn default() -> Self {
        Self {
            initiation_style: unknown(),
            response_patterns: unknown(),
            engagement_depth: unknown(),
            directness_level: unknown(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialProfile {
    pub communication_dynamics: CommunicationDynamics,
    pub collaboration_style: String,
    pub authority_positioning: String,
    pub audience_adaptation: BTreeMap<String, String>,
    pub relational_patterns: Vec<String>,
    pub conflict_approach: String,
    pub social_description: String,
    #[serde(deserialize_with = "unit_interval")]
    pub confidence: f32,
}

impl Default for SocialProfile {
    fn default() -> Self {
        Self {
            communication_dynamics: CommunicationDynamics::default(),
            collaboration_style: unknown(),
            authority_positioning: unknown(),
            audience_adaptation: BTreeMap::new(),
            relational_patterns: Vec::new(),
            conflict_approach: unknown(),
            social_description: "Unable to determine social patterns".into(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }
}

// ── Synthesis ───────────────────────────────────────────────────────────

/// Output of the synthesis pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Synthesis {
    pub personality_essence: String,
    pub key_characteristics: Vec<String>,
    pub context_variations: BTreeMap<String, String>,
    pub contradictions_resolved: Vec<String>,
    /// The model's own holistic estimate. Informational only.
    #[serde(deserialize_with = "optional_unit_interval")]
    pub overall_confidence: Option<f32>,
}

impl Default for Synthesis {
    fn default() -> Self {
        Self {
            personality_essence: "Unable to synthesize personality essence".into(),
            key_characteristics: Vec::new(),
            context_variations: BTreeMap::new(),
            contradictions_resolved: Vec::new(),
            overall_confidence: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisMetadata {
    pub documents_analyzed: usize,
    /// Characters divided by four.
    pub total_tokens_analyzed: usize,
    pub analysis_duration_seconds: f64,
    pub model_used: String,
    pub reported_confidence: Option<f32>,
}

// ── Profile ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    /// Assigned by the profile store on save; 0 until then.
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub writing_style: WritingStyleProfile,
    #[serde(default)]
    pub cognitive: CognitiveProfile,
    #[serde(default)]
    pub emotional: EmotionalProfile,
    #[serde(default)]
    pub interests: InterestProfile,
    #[serde(default)]
    pub worldview: WorldviewProfile,
    #[serde(default)]
    pub social: SocialProfile,
    #[serde(default)]
    pub personality_essence: String,
    #[serde(default)]
    pub key_characteristics: Vec<String>,
    #[serde(default)]
    pub context_variations: BTreeMap<String, String>,
    #[serde(default)]
    pub analysis_metadata: AnalysisMetadata,
    #[serde(default, deserialize_with = "unit_interval")]
    pub overall_confidence: f32,
}

impl PersonalityProfile {
    /// Decode six raw dimension payloads and combine them with the synthesis.
    ///
    /// A dimension missing from `raw` decodes to its defaults. The overall
    /// confidence is the mean of the six dimension confidences; the
    /// synthesis estimate is kept in the metadata only.
    pub fn assemble(
        raw: &RawAnalyses,
        synthesis: Synthesis,
        mut metadata: AnalysisMetadata,
    ) -> Result<Self, ProfileError> {
        let empty = Value::Object(Default::default());
        let payload = |d: Dimension| raw.get(&d).unwrap_or(&empty);

        metadata.reported_confidence = synthesis.overall_confidence;

        let mut profile = Self {
            version: 0,
            writing_style: decode_with_defaults(Dimension::WritingStyle.key(), payload(Dimension::WritingStyle))?,
            cognitive: decode_with_defaults(Dimension::Cognitive.key(), payload(Dimension::Cognitive))?,
            emotional: decode_with_defaults(Dimension::Emotional.key(), payload(Dimension::Emotional))?,
            interests: decode_with_defaults(Dimension::Interests.key(), payload(Dimension::Interests))?,
            worldview: decode_with_defaults(Dimension::Worldview.key(), payload(Dimension::Worldview))?,
            social: decode_with_defaults(Dimension::Social.key(), payload(Dimension::Social))?,
            personality_essence: synthesis.personality_essence,
            key_characteristics: synthesis.key_characteristics,
            context_variations: synthesis.context_variations,
            analysis_metadata: metadata,
            overall_confidence: 0.0,
        };
        profile.recompute_confidence();
        Ok(profile)
    }

    pub fn dimension_confidences(&self) -> [f32; 6] {
        [
            self.writing_style.confidence,
            self.cognitive.confidence,
            self.emotional.confidence,
            self.interests.confidence,
            self.worldview.confidence,
            self.social.confidence,
        ]
    }

    /// Re-derive `overall_confidence` after the dimensions changed.
    pub fn recompute_confidence(&mut self) {
        let scores = self.dimension_confidences();
        let mean = scores.iter().map(|c| c.clamp(0.0, 1.0)).sum::<f32>() / scores.len() as f32;
        self.overall_confidence = mean.clamp(0.0, 1.0);
    }

    /// Render the profile as the text block embedded in the system prompt.
    ///
    /// Sections appear in a fixed order; list-backed sections are left out
    /// when their list is empty.
    pub fn to_prompt_text(&self) -> String {
        let mut out = String::from("PERSONALITY PROFILE:\n\n");

        out.push_str(&format!("ESSENCE:\n{}\n", self.personality_essence));

        if !self.key_characteristics.is_empty() {
            out.push_str("\nKEY CHARACTERISTICS:\n");
            push_bullets(&mut out, &self.key_characteristics);
        }

        let ws = &self.writing_style;
        out.push_str(&format!(
            "\nWRITING VOICE:\n{}\n- Vocabulary: {}\n- Default tone: {}\n",
            ws.voice_description, ws.vocabulary_character, ws.tonal_range.default_tone
        ));

        let phrases = &ws.stylistic_markers.signature_phrases;
        if !phrases.is_empty() {
            out.push_str(&format!("\nSIGNATURE PHRASES: {}\n", quoted(top(phrases, 10))));
        }

        out.push_str(&format!(
            "\nTHINKING PATTERNS:\n{}\n",
            self.cognitive.thinking_description
        ));

        let emo = &self.emotional;
        out.push_str(&format!(
            "\nEMOTIONAL LANDSCAPE:\n{}\n",
            emo.emotional_description
        ));
        for (label, items) in [
            ("Excited by", &emo.triggers.excites),
            ("Frustrated by", &emo.triggers.frustrates),
            ("Motivated by", &emo.triggers.motivates),
        ] {
            if !items.is_empty() {
                out.push_str(&format!("- {label}: {}\n", top(items, 5).join(", ")));
            }
        }

        if !self.interests.genuine_interests.is_empty() {
            out.push_str(&format!(
                "\nINTERESTS:\n{}\n",
                self.interests.interest_description
            ));
            for interest in self.interests.genuine_interests.iter().take(5) {
                out.push_str(&format!(
                    "- {} (depth {:.1})\n",
                    interest.topic, interest.depth
                ));
            }
        }

        let wv = &self.worldview;
        out.push_str(&format!("\nWORLDVIEW:\n{}\n", wv.worldview_description));
        if !wv.core_beliefs.values_hierarchy.is_empty() {
            out.push_str("Values (in priority order):\n");
            push_bullets(&mut out, top(&wv.core_beliefs.values_hierarchy, 5));
        }

        out.push_str(&format!(
            "\nSOCIAL DYNAMICS:\n{}\n",
            self.social.social_description
        ));

        if !self.context_variations.is_empty() {
            out.push_str("\nCONTEXT VARIATIONS:\n");
            for (context, description) in &self.context_variations {
                out.push_str(&format!("- {context}: {description}\n"));
            }
        }

        out
    }
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        let mut profile = Self {
            version: 0,
            writing_style: WritingStyleProfile::default(),
            cognitive: CognitiveProfile::default(),
            emotional: EmotionalProfile::default(),
            interests: InterestProfile::default(),
            worldview: WorldviewProfile::default(),
            social: SocialProfile::default(),
            personality_essence: Synthesis::default().personality_essence,
            key_characteristics: Vec::new(),
            context_variations: BTreeMap::new(),
            analysis_metadata: AnalysisMetadata::default(),
            overall_confidence: 0.0,
        };
        profile.recompute_confidence();
        profile
    }
}

fn top(items: &[String], n: usize) -> &[String] {
    &items[..items.len().min(n)]
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|p| format!("\"{p}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

fn push_bullets(out: &mut String, items: &[String]) {
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_with(dimension: Dimension, value: Value) -> RawAnalyses {
        let mut raw = RawAnalyses::new();
        raw.insert(dimension, value);
        raw
    }

    #[test]
    fn dimension_order_and_names() {
        let keys: Vec<_> = Dimension::ALL.iter().map(|d| d.key()).collect();
        assert_eq!(
            keys,
            ["writing_style", "cognitive", "emotional", "interests", "worldview", "social"]
        );
        assert_eq!(Dimension::Interests.display_name(), "Interests & Desires");
        assert_eq!("social".parse::<Dimension>().unwrap(), Dimension::Social);
    }

    #[test]
    fn unknown_dimension_rejected() {
        let err = "humor".parse::<Dimension>().unwrap_err();
        assert!(matches!(err, ProfileError::UnknownDimension(ref d) if d == "humor"));
    }

    #[test]
    fn empty_object_decodes_to_defaults() {
        let ws: WritingStyleProfile = decode_with_defaults("writing_style", &json!({})).unwrap();
        assert_eq!(ws, WritingStyleProfile::default());
        assert_eq!(ws.confidence, 0.5);
        assert_eq!(ws.tonal_range.default_tone, "Neutral");
        assert_eq!(ws.stylistic_markers.punctuation_habits, "Standard");
    }

    #[test]
    fn partial_sub_record_keeps_field_defaults() {
        let cog: CognitiveProfile = decode_with_defaults(
            "cognitive",
            &json!({"reasoning_patterns": {"logical_style": "associative"}, "confidence": 0.8}),
        )
        .unwrap();
        assert_eq!(cog.reasoning_patterns.logical_style, "associative");
        assert_eq!(cog.reasoning_patterns.primary_mode, "Mixed");
        assert!((cog.confidence - 0.8).abs() < 1e-6);
    }

    #[test]
    fn nulls_are_treated_as_absent() {
        let emo: EmotionalProfile = decode_with_defaults(
            "emotional",
            &json!({"emotional_baseline": null, "triggers": {"excites": ["systems", null]}}),
        )
        .unwrap();
        assert_eq!(emo.emotional_baseline, "Unknown");
        assert_eq!(emo.triggers.excites, vec!["systems".to_string()]);
    }

    #[test]
    fn confidence_is_clamped_and_lenient() {
        let social: SocialProfile =
            decode_with_defaults("social", &json!({"confidence": 1.7})).unwrap();
        assert_eq!(social.confidence, 1.0);
        let social: SocialProfile =
            decode_with_defaults("social", &json!({"confidence": "0.25"})).unwrap();
        assert!((social.confidence - 0.25).abs() < 1e-6);
        let social: SocialProfile =
            decode_with_defaults("social", &json!({"confidence": "high"})).unwrap();
        assert_eq!(social.confidence, 0.5);
    }

    #[test]
    fn string_interests_become_default_depth() {
        let interests: InterestProfile = decode_with_defaults(
            "interests",
            &json!({"genuine_interests": ["sailing", {"topic": "compilers", "depth": 0.9}]}),
        )
        .unwrap();
        assert_eq!(interests.genuine_interests.len(), 2);
        assert_eq!(interests.genuine_interests[0].topic, "sailing");
        assert_eq!(interests.genuine_interests[0].depth, 0.5);
        assert_eq!(interests.genuine_interests[0].context, "Unknown");
        assert!((interests.genuine_interests[1].depth - 0.9).abs() < 1e-6);
    }

    #[test]
    fn non_object_is_rejected() {
        let err = decode_with_defaults::<SocialProfile>("social", &json!(["a"])).unwrap_err();
        assert!(matches!(err, ProfileError::NotAnObject { ref subject } if subject == "social"));
    }

    #[test]
    fn wrong_field_shape_is_rejected() {
        let err = decode_with_defaults::<EmotionalProfile>(
            "emotional",
            &json!({"triggers": "everything"}),
        )
        .unwrap_err();
        assert!(matches!(err, ProfileError::Invalid { ref subject, .. } if subject == "emotional"));
    }

    #[test]
    fn assemble_uses_mean_of_dimensions() {
        let mut raw = RawAnalyses::new();
        for (d, c) in Dimension::ALL.iter().zip([0.9, 0.6, 0.3, 0.6, 0.9, 0.3]) {
            raw.insert(*d, json!({ "confidence": c }));
        }
        let synthesis = Synthesis {
            overall_confidence: Some(0.99),
            ..Synthesis::default()
        };
        let profile =
            PersonalityProfile::assemble(&raw, synthesis, AnalysisMetadata::default()).unwrap();
        assert!((profile.overall_confidence - 0.6).abs() < 1e-6);
        assert_eq!(profile.analysis_metadata.reported_confidence, Some(0.99));
    }

    #[test]
    fn assemble_defaults_missing_dimensions() {
        let raw = raw_with(Dimension::Cognitive, json!({"confidence": 0.8}));
        let profile =
            PersonalityProfile::assemble(&raw, Synthesis::default(), AnalysisMetadata::default())
                .unwrap();
        assert_eq!(profile.writing_style, WritingStyleProfile::default());
        assert!((profile.overall_confidence - (0.8 + 0.5 * 5.0) / 6.0).abs() < 1e-6);
        assert_eq!(
            profile.personality_essence,
            "Unable to synthesize personality essence"
        );
    }

    #[test]
    fn recompute_after_edit() {
        let mut profile = PersonalityProfile::default();
        assert!((profile.overall_confidence - 0.5).abs() < 1e-6);
        profile.social.confidence = 1.0;
        profile.recompute_confidence();
        assert!((profile.overall_confidence - 3.5 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn synthesis_confidence_optional() {
        let s: Synthesis = decode_with_defaults("synthesis", &json!({})).unwrap();
        assert_eq!(s.overall_confidence, None);
        let s: Synthesis =
            decode_with_defaults("synthesis", &json!({"overall_confidence": 0.7})).unwrap();
        assert!((s.overall_confidence.unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn prompt_text_orders_sections_and_skips_empty_lists() {
        let mut profile = PersonalityProfile::default();
        profile.personality_essence = "A restless builder.".into();
        profile.key_characteristics = vec!["Curious".into(), "Blunt".into()];
        profile.writing_style.stylistic_markers.signature_phrases =
            vec!["ship it".into(), "first principles".into()];
        profile.emotional.triggers.excites = vec!["open source".into()];

        let text = profile.to_prompt_text();
        let pos = |needle: &str| text.find(needle).unwrap_or_else(|| panic!("missing {needle}"));

        assert!(pos("ESSENCE:") < pos("KEY CHARACTERISTICS:"));
        assert!(pos("KEY CHARACTERISTICS:") < pos("WRITING VOICE:"));
        assert!(pos("WRITING VOICE:") < pos("SIGNATURE PHRASES:"));
        assert!(pos("SIGNATURE PHRASES:") < pos("THINKING PATTERNS:"));
        assert!(pos("EMOTIONAL LANDSCAPE:") < pos("WORLDVIEW:"));
        assert!(pos("WORLDVIEW:") < pos("SOCIAL DYNAMICS:"));
        assert!(text.contains("\"ship it\", \"first principles\""));
        assert!(text.contains("- Excited by: open source"));
        assert!(!text.contains("Frustrated by"));
        assert!(!text.contains("INTERESTS:"));
        assert!(!text.contains("CONTEXT VARIATIONS:"));
    }

    #[test]
    fn prompt_text_includes_context_variations() {
        let mut profile = PersonalityProfile::default();
        profile
            .context_variations
            .insert("professional".into(), "Measured and precise".into());
        let text = profile.to_prompt_text();
        assert!(text.contains("CONTEXT VARIATIONS:\n- professional: Measured and precise"));
    }

    #[test]
    fn profile_round_trips_through_json() {
        let mut profile = PersonalityProfile::default();
        profile.version = 3;
        profile.interests.topic_affinities.insert("rust".into(), 0.9);
        let json = serde_json::to_value(&profile).unwrap();
        let back: PersonalityProfile = serde_json::from_value(json).unwrap();
        assert_eq!(back, profile);
    }
}
