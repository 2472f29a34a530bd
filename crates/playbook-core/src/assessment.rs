//! # Assessment Engine
//!
//! The 30-question readiness assessment.
//!
//! Answers are a flat `question id -> points` map. Total and per-domain
//! scores are pure sums recomputed on demand; domain membership comes from
//! the caller (the content question bank), never from stored state.
//!
//! `set_answer` records whatever it is given. The invariant that a value
//! matches one of the question's options is only enforced by
//! [`AssessmentState::set_checked_answer`].

use crate::primitives::{ASSESSMENT_QUESTION_COUNT, MAX_OPTION_POINTS};
use crate::{PlaybookError, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// QUESTION BANK (content)
// =============================================================================

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub label: String,
    pub points: u8,
}

/// A scored question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentQuestion {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<AnswerOption>,
}

impl AssessmentQuestion {
    /// Highest point value among the options.
    #[must_use]
    pub fn max_points(&self) -> u8 {
        self.options.iter().map(|o| o.points).max().unwrap_or(0)
    }
}

/// A group of questions scored together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentDomain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub questions: Vec<AssessmentQuestion>,
}

impl AssessmentDomain {
    /// Maximum attainable score from this domain's own options.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions.iter().map(|q| q.max_points() as u32).sum()
    }
}

/// The question bank, in presentation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssessmentBank {
    domains: Vec<AssessmentDomain>,
}

impl AssessmentBank {
    /// Create a bank from domains in presentation order.
    #[must_use]
    pub fn new(domains: Vec<AssessmentDomain>) -> Self {
        Self { domains }
    }

    /// All domains.
    #[must_use]
    pub fn domains(&self) -> &[AssessmentDomain] {
        &self.domains
    }

    /// Every question with its domain, in presentation order.
    pub fn questions(&self) -> impl Iterator<Item = (&AssessmentDomain, &AssessmentQuestion)> {
        self.domains
            .iter()
            .flat_map(|d| d.questions.iter().map(move |q| (d, q)))
    }

    /// Number of questions in the bank.
    #[must_use]
    pub fn question_count(&self) -> usize {
        self.domains.iter().map(|d| d.questions.len()).sum()
    }

    /// Find a question by id.
    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&AssessmentQuestion> {
        self.questions().map(|(_, q)| q).find(|q| &q.id == id)
    }

    /// The question at a cursor position.
    #[must_use]
    pub fn question_at(&self, index: usize) -> Option<&AssessmentQuestion> {
        self.questions().nth(index).map(|(_, q)| q)
    }

    /// Question ids belonging to a domain.
    #[must_use]
    pub fn domain_question_ids(&self, domain_id: &str) -> Vec<QuestionId> {
        self.domains
            .iter()
            .filter(|d| d.id == domain_id)
            .flat_map(|d| d.questions.iter().map(|q| q.id.clone()))
            .collect()
    }

    /// Maximum attainable score across the bank.
    #[must_use]
    pub fn max_score(&self) -> u32 {
        self.questions().map(|(_, q)| q.max_points() as u32).sum()
    }

    /// Check that `points` is one of the question's option values.
    pub fn validate_answer(&self, id: &QuestionId, points: u8) -> Result<(), PlaybookError> {
        let question = self
            .question(id)
            .ok_or_else(|| PlaybookError::InvalidQuestion(id.to_string()))?;
        if question.options.iter().any(|o| o.points == points) {
            Ok(())
        } else {
            Err(PlaybookError::InvalidAnswer {
                question: id.to_string(),
                points,
            })
        }
    }
}

// =============================================================================
// ANSWER STATE (persisted)
// =============================================================================

/// Recorded answers plus the question cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentState {
    #[serde(default)]
    answers: BTreeMap<QuestionId, u8>,
    #[serde(default)]
    current_question: usize,
}

impl AssessmentState {
    /// Create an empty answer set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a point value, overwriting any prior value. No validation.
    pub fn set_answer(&mut self, question: QuestionId, points: u8) {
        self.answers.insert(question, points);
    }

    /// Record a point value after checking it against the question bank.
    pub fn set_checked_answer(
        &mut self,
        bank: &AssessmentBank,
        question: QuestionId,
        points: u8,
    ) -> Result<(), PlaybookError> {
        bank.validate_answer(&question, points)?;
        self.set_answer(question, points);
        Ok(())
    }

    /// The recorded value for a question.
    #[must_use]
    pub fn answer(&self, question: &QuestionId) -> Option<u8> {
        self.answers.get(question).copied()
    }

    /// All recorded answers.
    #[must_use]
    pub fn answers(&self) -> &BTreeMap<QuestionId, u8> {
        &self.answers
    }

    /// Number of answered questions.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    /// Sum of all recorded point values.
    #[must_use]
    pub fn total_score(&self) -> u32 {
        self.answers.values().map(|&p| p as u32).sum()
    }

    /// Sum of recorded values for the given question subset.
    ///
    /// Without the questions themselves the maximum assumes every question
    /// offers the standard top score.
    #[must_use]
    pub fn domain_score(&self, domain_id: &str, question_ids: &[QuestionId]) -> DomainScore {
        let mut score = 0u32;
        let mut answered = 0usize;
        for id in question_ids {
            if let Some(&points) = self.answers.get(id) {
                score = score.saturating_add(points as u32);
                answered += 1;
            }
        }
        DomainScore {
            domain: domain_id.to_string(),
            score,
            answered,
            max: (question_ids.len() as u32).saturating_mul(MAX_OPTION_POINTS as u32),
        }
    }

    /// True iff exactly the fixed number of questions has been answered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.answers.len() == ASSESSMENT_QUESTION_COUNT
    }

    /// Clear all answers and the cursor.
    pub fn reset(&mut self) {
        self.answers.clear();
        self.current_question = 0;
    }

    // =========================================================================
    // CURSOR
    // =========================================================================

    /// Zero-based position of the question being shown.
    #[must_use]
    pub fn current_question(&self) -> usize {
        self.current_question
    }

    /// Move to the next question, stopping at the last one.
    pub fn advance(&mut self) -> usize {
        if self.current_question + 1 < ASSESSMENT_QUESTION_COUNT {
            self.current_question += 1;
        }
        self.current_question
    }

    /// Move to the previous question, stopping at the first one.
    pub fn go_back(&mut self) -> usize {
        self.current_question = self.current_question.saturating_sub(1);
        self.current_question
    }

    /// Jump to a question position.
    pub fn go_to(&mut self, index: usize) -> Result<(), PlaybookError> {
        if index >= ASSESSMENT_QUESTION_COUNT {
            return Err(PlaybookError::InvalidInput(format!(
                "Question index {} out of range (0..{})",
                index, ASSESSMENT_QUESTION_COUNT
            )));
        }
        self.current_question = index;
        Ok(())
    }

    // =========================================================================
    // RESULTS
    // =========================================================================

    /// Build the full results summary against a question bank.
    #[must_use]
    pub fn summarize(&self, bank: &AssessmentBank) -> AssessmentSummary {
        let max = bank.max_score();
        let total = self.total_score();
        let percentage = percentage(total, max);
        let domains = bank
            .domains()
            .iter()
            .map(|d| {
                let ids: Vec<QuestionId> = d.questions.iter().map(|q| q.id.clone()).collect();
                DomainScore {
                    max: d.max_score(),
                    ..self.domain_score(&d.id, &ids)
                }
            })
            .collect();

        AssessmentSummary {
            total,
            max,
            percentage,
            band: ReadinessBand::from_percentage(percentage),
            complete: self.is_complete(),
            domains,
        }
    }
}

/// Integer percentage of `score` out of `max`, capped at 100.
#[must_use]
pub fn percentage(score: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    ((score as u64).saturating_mul(100) / max as u64).min(100) as u8
}

// =============================================================================
// RESULT TYPES
// =============================================================================

/// Score for one domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: String,
    pub score: u32,
    pub answered: usize,
    pub max: u32,
}

impl DomainScore {
    /// Integer percentage of the domain maximum.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        percentage(self.score, self.max)
    }
}

/// Narrative readiness band for an overall percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessBand {
    /// 0–39%
    Early,
    /// 40–69%
    Developing,
    /// 70–89%
    Established,
    /// 90–100%
    Advanced,
}

impl ReadinessBand {
    /// Map a percentage to its band.
    #[must_use]
    pub fn from_percentage(percent: u8) -> Self {
        match percent {
            0..=39 => Self::Early,
            40..=69 => Self::Developing,
            70..=89 => Self::Established,
            _ => Self::Advanced,
        }
    }

    /// Display label.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Early => "Early stage",
            Self::Developing => "Developing",
            Self::Established => "Established",
            Self::Advanced => "Advanced",
        }
    }

    /// One-line recommendation shown with the results.
    #[must_use]
    pub fn recommendation(&self) -> &'static str {
        match self {
            Self::Early => "Start with scoping: agree the risk framework and identify material controls.",
            Self::Developing => "Document material controls and assign owners before testing begins.",
            Self::Established => "Run a dry-run effectiveness review and close remediation items.",
            Self::Advanced => "Focus on evidence quality and the board declaration wording.",
        }
    }
}

impl std::fmt::Display for ReadinessBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Complete results view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentSummary {
    pub total: u32,
    pub max: u32,
    pub percentage: u8,
    pub band: ReadinessBand,
    pub complete: bool,
    pub domains: Vec<DomainScore>,
}

// =============================================================================
// VIEW GATING
// =============================================================================

/// The three assessment screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentView {
    Intro,
    Questions,
    Results,
}

impl AssessmentView {
    /// Resolve a requested view: results redirect to the intro until the
    /// assessment is complete.
    #[must_use]
    pub fn resolve(requested: Self, state: &AssessmentState) -> Self {
        match requested {
            Self::Results if !state.is_complete() => Self::Intro,
            other => other,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    fn scale_options() -> Vec<AnswerOption> {
        (0..=MAX_OPTION_POINTS)
            .map(|p| AnswerOption {
                label: format!("Level {}", p),
                points: p,
            })
            .collect()
    }

    fn bank() -> AssessmentBank {
        AssessmentBank::new(vec![
            AssessmentDomain {
                id: "governance".to_string(),
                name: "Governance".to_string(),
                description: String::new(),
                questions: vec![
                    AssessmentQuestion {
                        id: q("q1"),
                        text: "Board oversight".to_string(),
                        options: scale_options(),
                    },
                    AssessmentQuestion {
                        id: q("q2"),
                        text: "Committee remit".to_string(),
                        options: scale_options(),
                    },
                ],
            },
            AssessmentDomain {
                id: "testing".to_string(),
                name: "Testing".to_string(),
                description: String::new(),
                questions: vec![AssessmentQuestion {
                    id: q("q3"),
                    text: "Testing cadence".to_string(),
                    options: vec![
                        AnswerOption {
                            label: "None".to_string(),
                            points: 0,
                        },
                        AnswerOption {
                            label: "Annual".to_string(),
                            points: 2,
                        },
                    ],
                }],
            },
        ])
    }

    #[test]
    fn total_is_sum_of_answers() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 4);
        state.set_answer(q("q2"), 2);
        assert_eq!(state.total_score(), 6);
    }

    #[test]
    fn set_answer_overwrites() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 4);
        state.set_answer(q("q1"), 1);
        assert_eq!(state.total_score(), 1);
        assert_eq!(state.answered_count(), 1);
    }

    #[test]
    fn unchecked_answer_accepts_out_of_range_value() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 200);
        assert_eq!(state.total_score(), 200);
    }

    #[test]
    fn checked_answer_rejects_non_option() {
        let mut state = AssessmentState::new();
        let bank = bank();

        let err = state
            .set_checked_answer(&bank, q("q3"), 3)
            .expect_err("3 is not an option of q3");
        assert!(matches!(err, PlaybookError::InvalidAnswer { points: 3, .. }));

        let err = state
            .set_checked_answer(&bank, q("nope"), 1)
            .expect_err("unknown question");
        assert!(matches!(err, PlaybookError::InvalidQuestion(_)));

        state
            .set_checked_answer(&bank, q("q3"), 2)
            .expect("valid option");
        assert_eq!(state.answer(&q("q3")), Some(2));
    }

    #[test]
    fn domain_score_sums_subset_only() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 3);
        state.set_answer(q("q2"), 1);
        state.set_answer(q("q3"), 2);

        let score = state.domain_score("governance", &[q("q1"), q("q2"), q("q9")]);
        assert_eq!(score.score, 4);
        assert_eq!(score.answered, 2);
        assert_eq!(score.max, 12);
    }

    #[test]
    fn complete_requires_exactly_thirty() {
        let mut state = AssessmentState::new();
        for i in 0..29 {
            state.set_answer(q(&format!("q{}", i)), 0);
        }
        assert!(!state.is_complete());

        state.set_answer(q("q29"), 0);
        assert!(state.is_complete());

        state.set_answer(q("q30"), 0);
        assert!(!state.is_complete());
    }

    #[test]
    fn reset_clears_answers_and_cursor() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 4);
        state.advance();
        state.advance();

        state.reset();

        assert_eq!(state.answered_count(), 0);
        assert_eq!(state.current_question(), 0);
    }

    #[test]
    fn cursor_is_bounded() {
        let mut state = AssessmentState::new();
        assert_eq!(state.go_back(), 0);

        state.go_to(ASSESSMENT_QUESTION_COUNT - 1).expect("last");
        assert_eq!(state.advance(), ASSESSMENT_QUESTION_COUNT - 1);
        assert!(state.go_to(ASSESSMENT_QUESTION_COUNT).is_err());
    }

    #[test]
    fn summary_uses_bank_maximum() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 4);
        state.set_answer(q("q2"), 4);
        state.set_answer(q("q3"), 2);

        let summary = state.summarize(&bank());
        assert_eq!(summary.max, 10);
        assert_eq!(summary.percentage, 100);
        assert_eq!(summary.band, ReadinessBand::Advanced);
        assert_eq!(summary.domains.len(), 2);
        assert!(!summary.complete);
    }

    #[test]
    fn domain_maxima_follow_question_options() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q3"), 2);

        let summary = state.summarize(&bank());
        let testing = summary
            .domains
            .iter()
            .find(|d| d.domain == "testing")
            .expect("testing domain");
        assert_eq!(testing.max, 2);
        assert_eq!(testing.percentage(), 100);

        let domain_total: u32 = summary.domains.iter().map(|d| d.max).sum();
        assert_eq!(domain_total, summary.max);
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(ReadinessBand::from_percentage(39), ReadinessBand::Early);
        assert_eq!(ReadinessBand::from_percentage(40), ReadinessBand::Developing);
        assert_eq!(ReadinessBand::from_percentage(69), ReadinessBand::Developing);
        assert_eq!(ReadinessBand::from_percentage(70), ReadinessBand::Established);
        assert_eq!(ReadinessBand::from_percentage(90), ReadinessBand::Advanced);
    }

    #[test]
    fn results_view_redirects_until_complete() {
        let mut state = AssessmentState::new();
        assert_eq!(
            AssessmentView::resolve(AssessmentView::Results, &state),
            AssessmentView::Intro
        );
        assert_eq!(
            AssessmentView::resolve(AssessmentView::Questions, &state),
            AssessmentView::Questions
        );

        for i in 0..ASSESSMENT_QUESTION_COUNT {
            state.set_answer(q(&format!("q{}", i)), 1);
        }
        assert_eq!(
            AssessmentView::resolve(AssessmentView::Results, &state),
            AssessmentView::Results
        );
    }

    #[test]
    fn state_roundtrips_through_json() {
        let mut state = AssessmentState::new();
        state.set_answer(q("q1"), 4);
        state.advance();

        let json = serde_json::to_string(&state).expect("serialize");
        assert!(json.contains("\"q1\":4"));
        let restored: AssessmentState = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, state);
    }
}
