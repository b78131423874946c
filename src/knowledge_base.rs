/// A single canned question/answer pair the tutor can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnowledgeEntry {
    pub prompt: &'static str,
    pub response: &'static str,
}

impl KnowledgeEntry {
    pub const fn new(prompt: &'static str, response: &'static str) -> Self {
        Self { prompt, response }
    }
}

/// Ordered, immutable collection of knowledge entries.
///
/// Entry order is significant: the keyword stage returns the first qualifying
/// entry and the similarity stage breaks ties on the lowest index.
#[derive(Debug, Clone)]
pub struct Corpus {
    entries: Vec<KnowledgeEntry>,
}

impl Corpus {
    pub fn new(entries: Vec<KnowledgeEntry>) -> Self {
        Self { entries }
    }

    /// The compiled-in tutoring FAQ.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_ENTRIES.to_vec())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KnowledgeEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KnowledgeEntry> {
        self.entries.iter()
    }

    pub fn prompts(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.prompt)
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::builtin()
    }
}

const BUILTIN_ENTRIES: &[KnowledgeEntry] = &[
    // Platform usage
    KnowledgeEntry::new(
        "How do I join live class?",
        "Click on any lesson from the Student Portal, then watch the video lesson. Teachers upload video content for you to learn at your own pace.",
    ),
    KnowledgeEntry::new(
        "How to attempt quiz?",
        "Go to Student Portal → Select a lesson → Click 'Start Learning' → After watching the video, click 'Take Quiz' to test your knowledge.",
    ),
    KnowledgeEntry::new(
        "How are recommendations generated?",
        "Our AI analyzes your quiz performance by topic. If you score below 70% in any topic, we recommend focusing on those areas for improvement.",
    ),
    KnowledgeEntry::new(
        "I forgot my password",
        "This platform doesn't require passwords! Just enter your name when taking quizzes to track your progress.",
    ),
    KnowledgeEntry::new(
        "How do I track my progress?",
        "Visit the Results page to see all your quiz attempts, scores, and performance analytics. You can access it from the main navigation.",
    ),
    KnowledgeEntry::new(
        "Can I retake a quiz?",
        "Yes! You can retake any quiz multiple times to improve your understanding and score.",
    ),
    // Fractions
    KnowledgeEntry::new(
        "What is a fraction?",
        "A fraction represents a part of a whole. It has two parts: numerator (top number) and denominator (bottom number). For example, in 3/4, 3 is the numerator and 4 is the denominator.",
    ),
    KnowledgeEntry::new(
        "How to add fractions?",
        "To add fractions: 1) Make denominators the same, 2) Add numerators, 3) Keep the denominator. Example: 1/4 + 1/4 = 2/4 = 1/2",
    ),
    KnowledgeEntry::new(
        "Convert 3/4 to decimal",
        "To convert 3/4 to decimal, divide 3 by 4: 3 ÷ 4 = 0.75",
    ),
    KnowledgeEntry::new(
        "What is equivalent fraction?",
        "Equivalent fractions represent the same value but look different. Example: 1/2 = 2/4 = 3/6. Multiply or divide both numerator and denominator by the same number.",
    ),
    KnowledgeEntry::new(
        "How to subtract fractions?",
        "Similar to addition: 1) Make denominators the same, 2) Subtract numerators, 3) Keep the denominator. Example: 3/4 - 1/4 = 2/4 = 1/2",
    ),
    // Study tips
    KnowledgeEntry::new(
        "How to study effectively?",
        "1) Watch video lessons completely, 2) Take notes of key points, 3) Practice with quizzes, 4) Review topics you scored low on, 5) Ask me questions when confused!",
    ),
    KnowledgeEntry::new(
        "I'm struggling with math",
        "Don't worry! Math takes practice. Start with basics, watch videos multiple times, take quizzes to identify weak areas, and ask specific questions. I'm here to help!",
    ),
    KnowledgeEntry::new(
        "Tips for rural students",
        "1) Use this platform regularly, 2) Don't hesitate to ask questions, 3) Practice consistently, 4) Connect with urban teachers through video lessons, 5) Believe in yourself!",
    ),
    KnowledgeEntry::new(
        "How does AI tutoring work?",
        "I use artificial intelligence to understand your questions and provide helpful explanations. I can help with concepts, solve doubts, give study tips, and guide you through problems.",
    ),
    // Technical support
    KnowledgeEntry::new(
        "Video not loading",
        "Try refreshing the page or check your internet connection. If the problem persists, the teacher might be updating the video content.",
    ),
    KnowledgeEntry::new(
        "Quiz not submitting",
        "Make sure you've answered all questions and entered your name. Check your internet connection and try again.",
    ),
    KnowledgeEntry::new(
        "How to contact teacher?",
        "Currently, you can learn from teacher-created videos and use this AI tutor for doubts. More direct communication features are coming soon!",
    ),
    // Motivation
    KnowledgeEntry::new(
        "I feel discouraged",
        "Learning is a journey with ups and downs. Every expert was once a beginner. Keep practicing, use this platform regularly, and celebrate small victories. You've got this!",
    ),
    KnowledgeEntry::new(
        "Am I smart enough?",
        "Absolutely! Intelligence isn't fixed - it grows with effort and practice. This platform is designed to help you learn at your own pace. Keep going!",
    ),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_corpus_is_stable() {
        let first = Corpus::builtin();
        let second = Corpus::builtin();

        assert_eq!(first.len(), 20);
        assert!(first.iter().eq(second.iter()));
        assert_eq!(first.get(6).unwrap().prompt, "What is a fraction?");
    }

    #[test]
    fn test_contact_answer_mentions_no_messaging() {
        let corpus = Corpus::builtin();
        let contact = corpus.get(17).unwrap();

        assert_eq!(contact.prompt, "How to contact teacher?");
        assert!(!contact.response.contains("Messages page"));
        assert!(contact.response.starts_with("Currently, you can learn from teacher-created videos"));
    }

    #[test]
    fn test_builtin_entries_are_non_empty() {
        for entry in Corpus::builtin().iter() {
            assert!(!entry.prompt.trim().is_empty());
            assert!(!entry.response.trim().is_empty());
        }
    }

    #[test]
    fn test_get_out_of_range() {
        let corpus = Corpus::new(vec![KnowledgeEntry::new("a b", "c")]);
        assert!(corpus.get(1).is_none());
        assert!(!corpus.is_empty());
    }
}
