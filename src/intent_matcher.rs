use rand::Rng;
use rand::seq::SliceRandom;
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;
use tracing::debug;

use crate::knowledge_base::Corpus;
use crate::similarity::SimilarityIndex;

/// Minimum number of shared words for the keyword stage to accept an entry.
pub const MIN_COMMON_WORDS: usize = 2;

/// Cosine similarity an entry must exceed for the similarity stage to answer.
pub const SIMILARITY_THRESHOLD: f64 = 0.3;

pub const EMPTY_INPUT_PROMPT: &str = "I'm here to help! You can ask me about math concepts, how to use the platform, study tips, or anything else related to your learning journey. What's on your mind?";

pub const GREETING_TRIGGERS: &[&str] = &[
    "hello",
    "hi",
    "hey",
    "good morning",
    "good afternoon",
    "good evening",
    "howdy",
    "sup",
];

pub const GREETING_RESPONSES: &[&str] = &[
    "Hello there! I'm your tutor, ready to help you learn and grow. What subject would you like to explore today?",
    "Hi! Great to see you here! I can help with math, study strategies, or any questions about the platform. What can I assist you with?",
    "Hey! Welcome to your learning session! I'm here to make your studies easier and more effective. How can I help?",
];

pub const THANKS_TRIGGERS: &[&str] = &["thank", "thanks", "thank you", "thx", "appreciate"];

pub const THANKS_RESPONSES: &[&str] = &[
    "You're very welcome! I'm always happy to help you succeed. Keep up the great work!",
    "My pleasure! That's what I'm here for. Feel free to ask me anything else, I love helping students learn!",
    "Glad I could help! Remember, there's no such thing as a silly question. I'm here whenever you need me!",
];

pub const DISTRESS_TRIGGERS: &[&str] = &[
    "tired",
    "difficult",
    "hard",
    "struggling",
    "confused",
    "frustrated",
    "give up",
    "quit",
];

pub const ENCOURAGEMENT: &str = "I understand learning can be challenging sometimes, but you're doing great by asking for help! Remember, every expert was once a beginner. Take a short break if needed, then let's tackle this together. What specific topic is giving you trouble?";

pub const COMPLIMENT_TRIGGERS: &[&str] = &["good", "great", "awesome", "amazing", "helpful", "smart"];

/// Words that mark a compliment as aimed at the tutor itself.
pub const SELF_REFERENCES: &[&str] = &["you", "tutor"];

pub const APPRECIATION: &str = "Thank you so much! Your kind words motivate me to help even more. I'm here to support your learning journey every step of the way. What else can we work on together?";

/// Topic name to the input keywords that signal it.
pub const TOPIC_KEYWORDS: &[(&str, &[&str])] = &[
    ("fraction", &["fraction", "fractions", "numerator", "denominator"]),
    ("decimal", &["decimal", "decimals", "point"]),
    ("quiz", &["quiz", "test", "exam", "question"]),
    ("video", &["video", "lesson", "watch"]),
    ("study", &["study", "learn", "practice"]),
];

pub const KEYWORD_SUFFIX: &str =
    "\n\nNeed more help? Feel free to ask follow-up questions or request examples!";

pub const SIMILARITY_SUFFIX: &str =
    "\n\nWas this helpful? If you need clarification or have a different question, just ask!";

pub const SUBJECT_TRIGGERS: &[&str] = &["math", "mathematics"];

pub const TOPIC_MENU: &str = "I love helping with math! I can explain fractions, decimals, basic operations, and more. Try asking specific questions like:\n• 'What is a fraction?'\n• 'How to add fractions?'\n• 'Convert fractions to decimals'\n\nWhat math topic interests you most?";

pub const HELP_TRIGGER: &str = "help";

pub const CAPABILITY_MENU: &str = "I'm here to help! You can ask me about:\n\n• Math concepts (fractions, decimals, operations)\n• Platform usage (taking quizzes, watching videos)\n• Study strategies (effective learning tips)\n• Motivation (staying focused and confident)\n\nWhat specific topic would you like to explore?";

pub const CLARIFY_RESPONSES: &[&str] = &[
    "I want to help, but I'm not sure I understand your question completely. Could you rephrase it or be more specific?\n\nI'm great at helping with:\n• Math concepts (fractions, decimals, etc.)\n• Platform navigation\n• Study tips and strategies\n• Quiz guidance",
    "Hmm, that's an interesting question! I might need a bit more context to give you the best answer.\n\nTry asking about:\n• Specific math topics\n• How to use platform features\n• Study techniques\n• Quiz preparation tips",
    "I'd love to help you with that! Could you provide a bit more detail or ask in a different way?\n\nPopular topics I can help with:\n• Mathematics explanations\n• Learning strategies\n• Platform tutorials\n• Academic support",
];

static WORD_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("word pattern is a valid regex"));

/// Which stage of the pipeline produced a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    EmptyInput,
    Greeting,
    Thanks,
    Distress,
    Compliment,
    KeywordMatch { index: usize },
    SimilarityMatch { index: usize },
    TopicHint,
    HelpHint,
    Fallback,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::EmptyInput => "empty_input",
            Intent::Greeting => "greeting",
            Intent::Thanks => "thanks",
            Intent::Distress => "distress",
            Intent::Compliment => "compliment",
            Intent::KeywordMatch { .. } => "keyword_match",
            Intent::SimilarityMatch { .. } => "similarity_match",
            Intent::TopicHint => "topic_hint",
            Intent::HelpHint => "help_hint",
            Intent::Fallback => "fallback",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub intent: Intent,
    pub text: String,
}

impl Reply {
    fn new(intent: Intent, text: impl Into<String>) -> Self {
        Self {
            intent,
            text: text.into(),
        }
    }
}

/// Tunable thresholds for the matching stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatcherSettings {
    pub min_common_words: usize,
    pub similarity_threshold: f64,
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            min_common_words: MIN_COMMON_WORDS,
            similarity_threshold: SIMILARITY_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Stage {
    EmptyInput,
    Greeting,
    Thanks,
    Distress,
    Compliment,
    Keyword,
    Similarity,
    TopicHint,
    HelpHint,
}

const PIPELINE: [Stage; 9] = [
    Stage::EmptyInput,
    Stage::Greeting,
    Stage::Thanks,
    Stage::Distress,
    Stage::Compliment,
    Stage::Keyword,
    Stage::Similarity,
    Stage::TopicHint,
    Stage::HelpHint,
];

#[derive(Debug, Clone)]
struct PreparedEntry {
    lowered_prompt: String,
    words: HashSet<String>,
}

/// Maps a student utterance to one canned tutor reply.
///
/// Construct once at startup and share behind an `Arc`; every method takes
/// `&self` and nothing is mutated after construction.
#[derive(Debug, Clone)]
pub struct IntentMatcher {
    corpus: Corpus,
    prepared: Vec<PreparedEntry>,
    index: SimilarityIndex,
    settings: MatcherSettings,
}

impl IntentMatcher {
    pub fn new(corpus: Corpus, settings: MatcherSettings) -> Self {
        let prepared = corpus
            .iter()
            .map(|entry| {
                let lowered_prompt = entry.prompt.to_lowercase();
                let words = words(&lowered_prompt);
                PreparedEntry {
                    lowered_prompt,
                    words,
                }
            })
            .collect();
        let index = SimilarityIndex::build(&corpus);

        debug!(
            component = "intent_matcher",
            corpus_size = corpus.len(),
            vocabulary_size = index.vocabulary_size(),
            "Intent matcher built"
        );

        Self {
            corpus,
            prepared,
            index,
            settings,
        }
    }

    pub fn with_builtin_corpus() -> Self {
        Self::new(Corpus::builtin(), MatcherSettings::default())
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn index(&self) -> &SimilarityIndex {
        &self.index
    }

    pub fn settings(&self) -> MatcherSettings {
        self.settings
    }

    /// Reply text for `utterance`, using the thread-local random source.
    pub fn respond(&self, utterance: &str) -> String {
        self.respond_with(utterance, &mut rand::thread_rng())
    }

    pub fn respond_with<R: Rng + ?Sized>(&self, utterance: &str, rng: &mut R) -> String {
        self.classify_with(utterance, rng).text
    }

    pub fn classify(&self, utterance: &str) -> Reply {
        self.classify_with(utterance, &mut rand::thread_rng())
    }

    /// Runs the stages in order; the first one that produces a reply wins.
    pub fn classify_with<R: Rng + ?Sized>(&self, utterance: &str, rng: &mut R) -> Reply {
        let normalized = utterance.trim().to_lowercase();

        let reply = PIPELINE
            .iter()
            .find_map(|stage| self.run_stage(*stage, &normalized, rng))
            .unwrap_or_else(|| Reply::new(Intent::Fallback, pick(rng, CLARIFY_RESPONSES)));

        debug!(
            component = "intent_matcher",
            intent = %reply.intent,
            input_length = normalized.len(),
            "Tutor reply selected"
        );
        reply
    }

    fn run_stage<R: Rng + ?Sized>(&self, stage: Stage, input: &str, rng: &mut R) -> Option<Reply> {
        match stage {
            Stage::EmptyInput => input
                .is_empty()
                .then(|| Reply::new(Intent::EmptyInput, EMPTY_INPUT_PROMPT)),
            Stage::Greeting => contains_any(input, GREETING_TRIGGERS)
                .then(|| Reply::new(Intent::Greeting, pick(rng, GREETING_RESPONSES))),
            Stage::Thanks => contains_any(input, THANKS_TRIGGERS)
                .then(|| Reply::new(Intent::Thanks, pick(rng, THANKS_RESPONSES))),
            Stage::Distress => contains_any(input, DISTRESS_TRIGGERS)
                .then(|| Reply::new(Intent::Distress, ENCOURAGEMENT)),
            Stage::Compliment => (contains_any(input, COMPLIMENT_TRIGGERS)
                && contains_any(input, SELF_REFERENCES))
            .then(|| Reply::new(Intent::Compliment, APPRECIATION)),
            Stage::Keyword => self.keyword_match(input),
            Stage::Similarity => self.similarity_match(input),
            Stage::TopicHint => contains_any(input, SUBJECT_TRIGGERS)
                .then(|| Reply::new(Intent::TopicHint, TOPIC_MENU)),
            Stage::HelpHint => input
                .contains(HELP_TRIGGER)
                .then(|| Reply::new(Intent::HelpHint, CAPABILITY_MENU)),
        }
    }

    /// First entry in corpus order sharing enough words with the input or
    /// belonging to a topic the input mentions.
    fn keyword_match(&self, input: &str) -> Option<Reply> {
        let input_words = words(input);

        let index = self.prepared.iter().position(|entry| {
            let common = entry.words.intersection(&input_words).count();
            common >= self.settings.min_common_words || topic_matches(input, &entry.lowered_prompt)
        })?;

        let entry = self.corpus.get(index)?;
        Some(Reply::new(
            Intent::KeywordMatch { index },
            format!("{}{}", entry.response, KEYWORD_SUFFIX),
        ))
    }

    fn similarity_match(&self, input: &str) -> Option<Reply> {
        let found = self.index.best_match(input)?;
        if found.score <= self.settings.similarity_threshold {
            return None;
        }

        let entry = self.corpus.get(found.index)?;
        Some(Reply::new(
            Intent::SimilarityMatch { index: found.index },
            format!("{}{}", entry.response, SIMILARITY_SUFFIX),
        ))
    }
}

impl Default for IntentMatcher {
    fn default() -> Self {
        Self::with_builtin_corpus()
    }
}

fn words(text: &str) -> HashSet<String> {
    WORD_PATTERN
        .find_iter(&text.to_lowercase())
        .map(|m| m.as_str().to_string())
        .collect()
}

fn contains_any(input: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| input.contains(needle))
}

fn topic_matches(input: &str, lowered_prompt: &str) -> bool {
    TOPIC_KEYWORDS
        .iter()
        .any(|(topic, keywords)| contains_any(input, keywords) && lowered_prompt.contains(topic))
}

fn pick<R: Rng + ?Sized>(rng: &mut R, options: &[&'static str]) -> &'static str {
    options.choose(rng).copied().unwrap_or(EMPTY_INPUT_PROMPT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::KnowledgeEntry;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn matcher() -> IntentMatcher {
        IntentMatcher::with_builtin_corpus()
    }

    #[test]
    fn test_empty_input_prompt() {
        let matcher = matcher();
        assert_eq!(matcher.respond(""), EMPTY_INPUT_PROMPT);
        assert_eq!(matcher.respond("   \t\n"), EMPTY_INPUT_PROMPT);
    }

    #[test]
    fn test_greeting_returns_allowed_variant() {
        let matcher = matcher();
        let mut rng = rng();
        for input in ["Hello", "hey there", "Good Morning tutor", "HOWDY"] {
            let reply = matcher.classify_with(input, &mut rng);
            assert_eq!(reply.intent, Intent::Greeting, "input: {input}");
            assert!(GREETING_RESPONSES.contains(&reply.text.as_str()));
        }
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let matcher = matcher();
        let first = matcher.respond_with("hello", &mut StdRng::seed_from_u64(42));
        let second = matcher.respond_with("hello", &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_greeting_beats_thanks() {
        let reply = matcher().classify_with("hello and thanks", &mut rng());
        assert_eq!(reply.intent, Intent::Greeting);
    }

    #[test]
    fn test_thanks_variants() {
        let matcher = matcher();
        let mut rng = rng();
        for input in ["thanks!", "Thank you so much", "thx", "I appreciate it"] {
            let reply = matcher.classify_with(input, &mut rng);
            assert_eq!(reply.intent, Intent::Thanks, "input: {input}");
            assert!(THANKS_RESPONSES.contains(&reply.text.as_str()));
        }
    }

    #[test]
    fn test_distress_is_deterministic() {
        let matcher = matcher();
        assert_eq!(matcher.respond("fractions are so difficult"), ENCOURAGEMENT);
        assert_eq!(matcher.respond("I want to give up"), ENCOURAGEMENT);
    }

    #[test]
    fn test_compliment_needs_self_reference() {
        let matcher = matcher();
        assert_eq!(matcher.respond("you are awesome"), APPRECIATION);
        assert_eq!(matcher.respond("great tutor"), APPRECIATION);

        let reply = matcher.classify_with("awesome", &mut rng());
        assert_ne!(reply.intent, Intent::Compliment);
    }

    #[test]
    fn test_topic_keyword_selects_first_topic_entry() {
        let reply = matcher().classify_with("numerator", &mut rng());
        // "What is a fraction?" is the first prompt mentioning the topic
        assert_eq!(reply.intent, Intent::KeywordMatch { index: 6 });
        assert!(reply.text.ends_with(KEYWORD_SUFFIX));
    }

    #[test]
    fn test_keyword_overlap_uses_corpus_order() {
        let corpus = Corpus::new(vec![
            KnowledgeEntry::new("alpha omega", "zero"),
            KnowledgeEntry::new("red blue green", "one"),
            KnowledgeEntry::new("red blue yellow", "two"),
        ]);
        let matcher = IntentMatcher::new(corpus, MatcherSettings::default());

        let reply = matcher.classify_with("red blue yellow", &mut rng());
        assert_eq!(reply.intent, Intent::KeywordMatch { index: 1 });
        assert_eq!(reply.text, format!("one{KEYWORD_SUFFIX}"));
    }

    #[test]
    fn test_single_shared_word_falls_to_similarity() {
        let corpus = Corpus::new(vec![
            KnowledgeEntry::new("alpha omega", "zero"),
            KnowledgeEntry::new("red blue green", "one"),
        ]);
        let matcher = IntentMatcher::new(corpus, MatcherSettings::default());

        let reply = matcher.classify_with("omega", &mut rng());
        assert_eq!(reply.intent, Intent::SimilarityMatch { index: 0 });
        assert_eq!(reply.text, format!("zero{SIMILARITY_SUFFIX}"));
    }

    #[test]
    fn test_similarity_threshold_is_exclusive() {
        let corpus = Corpus::new(vec![KnowledgeEntry::new("alpha omega", "zero")]);
        let strict = MatcherSettings {
            min_common_words: MIN_COMMON_WORDS,
            similarity_threshold: 1.0,
        };
        let matcher = IntentMatcher::new(corpus, strict);

        // cosine is ~0.71 here, nothing can exceed 1.0
        let reply = matcher.classify_with("omega", &mut rng());
        assert_eq!(reply.intent, Intent::Fallback);
    }

    #[test]
    fn test_unknown_words_reach_hint_stages() {
        let matcher = matcher();
        let mut rng = rng();

        let reply = matcher.classify_with("zebra mathematics", &mut rng);
        assert_eq!(reply.intent, Intent::TopicHint);
        assert_eq!(reply.text, TOPIC_MENU);

        let reply = matcher.classify_with("zebra help", &mut rng);
        assert_eq!(reply.intent, Intent::HelpHint);
        assert_eq!(reply.text, CAPABILITY_MENU);

        let reply = matcher.classify_with("zebra xylophone", &mut rng);
        assert_eq!(reply.intent, Intent::Fallback);
        assert!(CLARIFY_RESPONSES.contains(&reply.text.as_str()));
    }

    #[test]
    fn test_custom_min_common_words() {
        let corpus = Corpus::new(vec![KnowledgeEntry::new("red blue", "colours")]);
        let settings = MatcherSettings {
            min_common_words: 1,
            similarity_threshold: SIMILARITY_THRESHOLD,
        };
        let matcher = IntentMatcher::new(corpus, settings);

        let reply = matcher.classify_with("red", &mut rng());
        assert_eq!(reply.intent, Intent::KeywordMatch { index: 0 });
    }

    #[test]
    fn test_intent_display() {
        assert_eq!(Intent::KeywordMatch { index: 3 }.to_string(), "keyword_match");
        assert_eq!(Intent::Fallback.to_string(), "fallback");
    }
}
