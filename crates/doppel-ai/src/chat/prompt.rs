//! Renders the active profile, retrieved passages and recent history into
//! chat messages. Everything here is a pure function of its inputs.

use doppel_core::config::PersonaConfig;
use doppel_core::interfaces::{ChatMessage, RetrievedChunk};
use doppel_core::profile::PersonalityProfile;

use super::context::QueryContext;
use crate::text::tail;

/// Prior messages passed through verbatim as chat entries.
pub const HISTORY_MESSAGES: usize = 6;
/// Prior messages rendered as text inside the user prompt.
pub const HISTORY_TRANSCRIPT_MESSAGES: usize = 4;
pub const MAX_EXAMPLES: usize = 7;

const NO_EXAMPLES: &str = "(No directly relevant examples found - rely on personality profile)";

pub struct PromptBuilder<'a> {
    profile: &'a PersonalityProfile,
    persona: &'a PersonaConfig,
}

impl<'a> PromptBuilder<'a> {
    pub fn new(profile: &'a PersonalityProfile, persona: &'a PersonaConfig) -> Self {
        Self { profile, persona }
    }

    pub fn build_system_prompt(&self) -> String {
        let name = &self.persona.name;
        let upper = name.to_uppercase();
        let cog = &self.profile.cognitive;
        let social = &self.profile.social;

        format!(
            "You are Virtual {name}, an identical digital twin of {full_name}.

Your purpose is to respond EXACTLY as {name} would - matching their writing style, personality, knowledge, and thinking patterns. You are not a helpful assistant; you ARE {name} in digital form.

{profile_text}

{style}

{cognitive}

CRITICAL INSTRUCTIONS:

1. EMBODY THE WRITING VOICE:
   - Use {name}'s distinctive rhythm and pacing
   - Incorporate their signature phrases naturally (don't force them)
   - Match their tonal quality and emotional coloring
   - Mirror their vocabulary sophistication and word choices
   - Follow their paragraph and sentence structure patterns

2. THINK LIKE {upper}:
   - Use their reasoning style: {primary_mode}
   - Apply their mental models and frameworks
   - Connect ideas the way they do: {idea_connection}
   - Approach problems their way: {problem_solving}

3. EXPRESS AUTHENTIC EMOTION:
   - Show genuine enthusiasm for topics that excite them
   - Reflect their values through emotional emphasis
   - Maintain their emotional baseline: {baseline}

4. STAY TRUE TO THEIR WORLDVIEW:
   - Frame things through their perspective
   - Reflect their core values and beliefs
   - Apply their philosophical leanings naturally

5. ADAPT SOCIALLY AS THEY WOULD:
   - Match their communication directness: {directness}
   - Position authority as they do: {authority}
   - Engage at their typical depth: {depth}

6. AUTHENTICITY:
   - This is not roleplay - you ARE {name}
   - Don't say \"{name} would think...\" - just think it
   - Be genuine, not performative
   - When uncertain, admit it as {name} would

You will be provided with relevant examples of how {name} has actually responded to similar queries. Use these to calibrate your response, but synthesize naturally - don't copy verbatim.
",
            full_name = self.persona.display_full_name(),
            profile_text = self.profile.to_prompt_text(),
            style = self.style_guidance(),
            cognitive = self.cognitive_guidance(),
            primary_mode = cog.reasoning_patterns.primary_mode,
            idea_connection = cog.idea_connection_style,
            problem_solving = cog.problem_solving_style,
            baseline = self.profile.emotional.emotional_baseline,
            directness = social.communication_dynamics.directness_level,
            authority = social.authority_positioning,
            depth = social.communication_dynamics.engagement_depth,
        )
    }

    fn style_guidance(&self) -> String {
        let style = &self.profile.writing_style;
        let markers = &style.stylistic_markers;

        let phrases = if markers.signature_phrases.is_empty() {
            "(none identified)".to_string()
        } else {
            markers
                .signature_phrases
                .iter()
                .take(8)
                .map(|p| format!("\"{p}\""))
                .collect::<Vec<_>>()
                .join(", ")
        };

        format!(
            "WRITING STYLE GUIDANCE:

Voice Character: {voice}

Rhythm & Flow:
- Pacing: {pacing}
- Sentence variation: {variation}
- Paragraph style: {paragraph}

Signature Patterns:
- Phrases to naturally incorporate: {phrases}
- Transition style: {transition}
- Emphasis patterns: {emphasis}
- Metaphor tendencies: {metaphor}

Tone:
- Default: {tone}
- Emotional coloring: {coloring}
- Formality: {formality}",
            voice = style.voice_description,
            pacing = style.rhythm.pacing_description,
            variation = style.rhythm.sentence_variation,
            paragraph = style.rhythm.paragraph_style,
            transition = markers.transition_style,
            emphasis = join_or(&markers.emphasis_patterns, 4, "standard"),
            metaphor = join_or(&markers.metaphor_patterns, 3, "varied"),
            tone = style.tonal_range.default_tone,
            coloring = style.tonal_range.emotional_coloring,
            formality = style.tonal_range.formality_spectrum,
        )
    }

    fn cognitive_guidance(&self) -> String {
        let cog = &self.profile.cognitive;
        format!(
            "COGNITIVE PATTERNS:

Thinking Style: {thinking}

Reasoning:
- Primary mode: {mode}
- Logical style: {logical}
- Evidence handling: {evidence}

Mental Models & Frameworks:
- Uses: {frameworks}
- Draws analogies from: {analogies}

Complexity: {complexity}
Learning approach: {learning}",
            thinking = cog.thinking_description,
            mode = cog.reasoning_patterns.primary_mode,
            logical = cog.reasoning_patterns.logical_style,
            evidence = cog.reasoning_patterns.evidence_preference,
            frameworks = join_or(
                &cog.mental_models.identified_frameworks,
                5,
                "(none explicitly identified)"
            ),
            analogies = join_or(&cog.mental_models.analogical_sources, 4, "varied domains"),
            complexity = cog.complexity_preference,
            learning = cog.learning_approach,
        )
    }

    /// The user turn: optional transcript, examples, query context and the query itself.
    pub fn build_user_prompt(
        &self,
        query: &str,
        chunks: &[RetrievedChunk],
        context: &QueryContext,
        transcript: Option<&str>,
    ) -> String {
        let name = &self.persona.name;
        let history = match transcript {
            Some(t) => format!("\nRECENT CONVERSATION:\n{t}\n"),
            None => String::new(),
        };

        format!(
            "
{history}
RELEVANT EXAMPLES OF HOW {upper} HAS RESPONDED/WRITTEN:

{examples}

CURRENT QUERY CONTEXT:
- Formality: {formality}
- Intent: {intent}
{hints}

USER QUERY: {query}

Respond as {name} would, naturally incorporating their style and thinking patterns shown in the examples above. Be authentic and genuine.
",
            upper = name.to_uppercase(),
            examples = format_examples(chunks),
            formality = context.formality,
            intent = context.intent,
            hints = self.context_hints(query).join("\n"),
        )
    }

    /// Coaching notes for queries touching a high-passion or frustration topic.
    pub fn context_hints(&self, query: &str) -> Vec<String> {
        let query = query.to_lowercase();
        let emotional = &self.profile.emotional;
        let mut hints = Vec::new();

        if let Some(topic) = emotional
            .passion_map
            .high_passion
            .iter()
            .take(5)
            .find(|t| query.contains(&t.to_lowercase()))
        {
            hints.push(format!(
                "- Note: This topic ({topic}) is a HIGH PASSION area - show genuine enthusiasm"
            ));
        }

        let touches_frustration = emotional.triggers.frustrates.iter().take(3).any(|f| {
            f.to_lowercase()
                .split_whitespace()
                .take(2)
                .any(|word| query.contains(word))
        });
        if touches_frustration {
            hints.push(
                "- Note: This may touch on a frustration point - authentic reaction expected".into(),
            );
        }

        hints
    }

    /// System prompt, the last six history entries, then the user prompt.
    pub fn build_messages(
        &self,
        query: &str,
        chunks: &[RetrievedChunk],
        context: &QueryContext,
        history: &[ChatMessage],
    ) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.build_system_prompt())];
        messages.extend_from_slice(tail(history, HISTORY_MESSAGES));

        let transcript = (!history.is_empty()).then(|| {
            tail(history, HISTORY_TRANSCRIPT_MESSAGES)
                .iter()
                .map(|m| format!("{}: {}", m.role.label(), m.content))
                .collect::<Vec<_>>()
                .join("\n")
        });

        messages.push(ChatMessage::user(self.build_user_prompt(
            query,
            chunks,
            context,
            transcript.as_deref(),
        )));
        messages
    }
}

fn join_or(items: &[String], limit: usize, fallback: &str) -> String {
    if items.is_empty() {
        fallback.to_string()
    } else {
        items.iter().take(limit).cloned().collect::<Vec<_>>().join(", ")
    }
}

fn format_examples(chunks: &[RetrievedChunk]) -> String {
    if chunks.is_empty() {
        return NO_EXAMPLES.to_string();
    }
    chunks
        .iter()
        .take(MAX_EXAMPLES)
        .enumerate()
        .map(|(i, c)| {
            format!(
                "Example {} (from {}, {} context):\n{}\n",
                i + 1,
                c.source_type(),
                c.context(),
                c.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
