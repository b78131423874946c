use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;

/// Topics scoring strictly below this percentage are recommended for review.
pub const MASTERY_THRESHOLD: f64 = 70.0;

/// Topic assigned to questions without one.
pub const DEFAULT_TOPIC: &str = "general";

/// A multiple-choice question as stored by the quiz authoring side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option_index: i64,
    pub topic: Option<String>,
}

impl Question {
    pub fn topic_or_default(&self) -> &str {
        match self.topic.as_deref().map(str::trim) {
            Some(topic) if !topic.is_empty() => topic,
            _ => DEFAULT_TOPIC,
        }
    }
}

/// Submitted answers keyed by question id, in submission order.
///
/// Values are kept as raw JSON so that a malformed answer only ever counts
/// as incorrect instead of rejecting the whole submission. Keys are trimmed
/// on the way in; a repeated key keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnswerMap {
    answers: Vec<(String, Value)>,
}

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, question_id: impl ToString, chosen: impl Into<Value>) {
        let key = question_id.to_string().trim().to_string();
        let chosen = chosen.into();
        match self.answers.iter_mut().find(|(k, _)| *k == key) {
            Some((_, value)) => *value = chosen,
            None => self.answers.push((key, chosen)),
        }
    }

    pub fn with(mut self, question_id: impl ToString, chosen: impl Into<Value>) -> Self {
        self.insert(question_id, chosen);
        self
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// The chosen option index, or `None` when absent or not an integer.
    ///
    /// The canonical key (`"7"` for question 7) wins; otherwise the first
    /// submitted key that parses to the same id, such as `"07"` or `"+7"`.
    pub fn chosen_index(&self, question_id: i64) -> Option<i64> {
        let canonical = question_id.to_string();
        let value = self
            .answers
            .iter()
            .find(|(k, _)| *k == canonical)
            .or_else(|| {
                self.answers
                    .iter()
                    .find(|(k, _)| k.parse::<i64>().ok() == Some(question_id))
            })
            .map(|(_, v)| v)?;
        parse_index(value)
    }
}

impl<K: ToString, V: Into<Value>> FromIterator<(K, V)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AnswerMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl Serialize for AnswerMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.answers.len()))?;
        for (question_id, chosen) in &self.answers {
            map.serialize_entry(question_id, chosen)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AnswerMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AnswerMapVisitor;

        impl<'de> Visitor<'de> for AnswerMapVisitor {
            type Value = AnswerMap;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object mapping question ids to chosen options")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<AnswerMap, A::Error> {
                let mut answers = AnswerMap::new();
                while let Some((question_id, chosen)) =
                    access.next_entry::<String, serde_json::Value>()?
                {
                    answers.insert(question_id, chosen);
                }
                Ok(answers)
            }
        }

        deserializer.deserialize_map(AnswerMapVisitor)
    }
}

fn parse_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTally {
    pub right: u32,
    pub total: u32,
}

impl TopicTally {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            f64::from(self.right) / f64::from(self.total) * 100.0
        }
    }
}

/// Per-topic tallies in the order topics were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TopicBreakdown {
    tallies: Vec<(String, TopicTally)>,
}

impl TopicBreakdown {
    fn entry(&mut self, topic: &str) -> &mut TopicTally {
        let position = match self.tallies.iter().position(|(t, _)| t == topic) {
            Some(position) => position,
            None => {
                self.tallies.push((topic.to_string(), TopicTally::default()));
                self.tallies.len() - 1
            }
        };
        &mut self.tallies[position].1
    }

    pub fn get(&self, topic: &str) -> Option<&TopicTally> {
        self.tallies
            .iter()
            .find(|(t, _)| t == topic)
            .map(|(_, tally)| tally)
    }

    pub fn len(&self) -> usize {
        self.tallies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicTally)> {
        self.tallies.iter().map(|(t, tally)| (t.as_str(), tally))
    }
}

impl Serialize for TopicBreakdown {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tallies.len()))?;
        for (topic, tally) in &self.tallies {
            map.serialize_entry(topic, tally)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub topic: String,
    pub score_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score_percent: f64,
    pub topic_detail: TopicBreakdown,
    pub recommendations: Vec<Recommendation>,
}

impl ScoreResult {
    fn empty() -> Self {
        Self {
            score_percent: 0.0,
            topic_detail: TopicBreakdown::default(),
            recommendations: Vec::new(),
        }
    }

    /// JSON blob of the per-topic tallies, persisted next to the score.
    pub fn detail_json(&self) -> String {
        serde_json::to_string(&self.topic_detail).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Scores a submission against its questions.
///
/// Missing, out-of-range or non-numeric answers count as wrong. Topics below
/// [`MASTERY_THRESHOLD`] are returned as recommendations in first-seen order.
pub fn score(questions: &[Question], answers: &AnswerMap) -> ScoreResult {
    if questions.is_empty() {
        return ScoreResult::empty();
    }

    let mut topic_detail = TopicBreakdown::default();
    let mut correct = 0u32;

    for question in questions {
        let tally = topic_detail.entry(question.topic_or_default());
        tally.total += 1;

        if answers.chosen_index(question.id) == Some(question.correct_option_index) {
            tally.right += 1;
            correct += 1;
        }
    }

    let score_percent = round2(f64::from(correct) / questions.len() as f64 * 100.0);

    let recommendations = topic_detail
        .iter()
        .filter(|(_, tally)| tally.percent() < MASTERY_THRESHOLD)
        .map(|(topic, tally)| Recommendation {
            topic: topic.to_string(),
            score_pct: round2(tally.percent()),
        })
        .collect();

    ScoreResult {
        score_percent,
        topic_detail,
        recommendations,
    }
}

/// Two decimal places, ties to even.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn question(id: i64, correct: i64, topic: Option<&str>) -> Question {
        Question {
            id,
            prompt: format!("Question {id}"),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_option_index: correct,
            topic: topic.map(str::to_string),
        }
    }

    #[test]
    fn test_topic_defaults_to_general() {
        assert_eq!(question(1, 0, None).topic_or_default(), "general");
        assert_eq!(question(1, 0, Some("  ")).topic_or_default(), "general");
        assert_eq!(question(1, 0, Some("decimal")).topic_or_default(), "decimal");
    }

    #[test]
    fn test_answer_parsing_tolerates_shapes() {
        let answers: AnswerMap = serde_json::from_value(json!({
            "1": 2,
            "2": "3",
            "3": 1.0,
            "4": "abc",
            "5": null,
            "6": [1],
            " 7 ": 0
        }))
        .unwrap();

        assert_eq!(answers.chosen_index(1), Some(2));
        assert_eq!(answers.chosen_index(2), Some(3));
        assert_eq!(answers.chosen_index(3), Some(1));
        assert_eq!(answers.chosen_index(4), None);
        assert_eq!(answers.chosen_index(5), None);
        assert_eq!(answers.chosen_index(6), None);
        assert_eq!(answers.chosen_index(7), Some(0));
        assert_eq!(answers.chosen_index(99), None);
    }

    #[test]
    fn test_integer_keys_via_builder() {
        let answers = AnswerMap::new().with(10, 1).with("11", "2");
        assert_eq!(answers.chosen_index(10), Some(1));
        assert_eq!(answers.chosen_index(11), Some(2));
    }

    #[test]
    fn test_breakdown_preserves_first_seen_order() {
        let questions = vec![
            question(1, 0, Some("zeta")),
            question(2, 0, Some("alpha")),
            question(3, 0, Some("zeta")),
        ];
        let result = score(&questions, &AnswerMap::new());

        let topics: Vec<&str> = result.topic_detail.iter().map(|(t, _)| t).collect();
        assert_eq!(topics, vec!["zeta", "alpha"]);
        assert_eq!(
            result.detail_json(),
            r#"{"zeta":{"right":0,"total":2},"alpha":{"right":0,"total":1}}"#
        );
    }

    #[test]
    fn test_out_of_range_answer_is_wrong() {
        let questions = vec![question(1, 2, None)];
        let answers = AnswerMap::new().with(1, 42);
        let result = score(&questions, &answers);

        assert_eq!(result.score_percent, 0.0);
        assert_eq!(result.topic_detail.get("general"), Some(&TopicTally { right: 0, total: 1 }));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(100.0), 100.0);
    }

    #[test]
    fn test_round2_exact_halves_go_to_even() {
        assert_eq!(round2(3.125), 3.12);
        assert_eq!(round2(15.625), 15.62);
        assert_eq!(round2(28.125), 28.12);
        assert_eq!(round2(0.375), 0.38);
    }

    #[test]
    fn test_one_of_thirty_two_rounds_to_even() {
        let questions: Vec<Question> = (1..=32).map(|id| question(id, 0, None)).collect();

        let result = score(&questions, &AnswerMap::new().with(1, 0));
        assert_eq!(result.score_percent, 3.12);
        assert_eq!(result.recommendations[0].score_pct, 3.12);

        let five: AnswerMap = (1..=5).map(|id| (id, 0)).collect();
        assert_eq!(score(&questions, &five).score_percent, 15.62);
    }

    #[test]
    fn test_ambiguous_keys_resolve_the_same_every_time() {
        let raw = r#"{"01":0," 1":1,"+1":1,"1 ":1}"#;
        let questions = vec![question(1, 0, None)];

        let scores: Vec<f64> = (0..200)
            .map(|_| {
                let answers: AnswerMap = serde_json::from_str(raw).unwrap();
                score(&questions, &answers).score_percent
            })
            .collect();
        assert!(scores.iter().all(|s| *s == scores[0]));
        // " 1" and "1 " trim to the canonical key, which wins over "01"
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_non_canonical_keys_use_submission_order() {
        let answers: AnswerMap = serde_json::from_str(r#"{"+1":2,"01":0}"#).unwrap();
        assert_eq!(answers.chosen_index(1), Some(2));

        let answers: AnswerMap = serde_json::from_str(r#"{"01":0,"+1":2}"#).unwrap();
        assert_eq!(answers.chosen_index(1), Some(0));
    }

    #[test]
    fn test_deserialized_keys_are_trimmed_like_inserted_ones() {
        let parsed: AnswerMap = serde_json::from_str(r#"{" 4 ":1,"5":"2"}"#).unwrap();
        let built = AnswerMap::new().with(" 4 ", 1).with(5, "2");

        assert_eq!(parsed, built);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), r#"{"4":1,"5":"2"}"#);
    }

    #[test]
    fn test_repeated_key_keeps_last_value() {
        let answers = AnswerMap::new().with(3, 0).with(" 3", 2);
        assert_eq!(answers.len(), 1);
        assert_eq!(answers.chosen_index(3), Some(2));
    }

    #[test]
    fn test_tally_percent_with_zero_total() {
        assert_eq!(TopicTally::default().percent(), 0.0);
    }
}
