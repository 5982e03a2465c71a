//! Quiz grading and progress arithmetic shared by the server and the exporter.

use crate::models::{Module, Quiz};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Integer percentage, truncated; zero when there is nothing to count
pub fn percent(done: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        (done * 100 / total) as u32
    }
}

/// Outcome of grading one question
#[derive(Debug, Clone, Serialize)]
pub struct QuestionOutcome {
    pub question_id: String,
    pub prompt: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
}

/// Outcome of grading a whole submission
#[derive(Debug, Clone, Serialize)]
pub struct QuizOutcome {
    pub correct: usize,
    pub total: usize,
    pub score_pct: u32,
    pub passing: bool,
    pub results: Vec<QuestionOutcome>,
}

impl Quiz {
    /// Grade a submission keyed by question id. Unanswered questions count
    /// as wrong with an empty answer.
    pub fn grade(&self, answers: &HashMap<String, String>) -> QuizOutcome {
        let results: Vec<QuestionOutcome> = self
            .questions
            .iter()
            .map(|q| {
                let user_answer = answers.get(&q.id).cloned().unwrap_or_default();
                QuestionOutcome {
                    question_id: q.id.clone(),
                    prompt: q.prompt.clone(),
                    is_correct: user_answer == q.correct,
                    user_answer,
                    correct_answer: q.correct.clone(),
                    explanation: q.explanation.clone(),
                }
            })
            .collect();

        let correct = results.iter().filter(|r| r.is_correct).count();
        let total = results.len();
        let score_pct = percent(correct, total);

        QuizOutcome {
            correct,
            total,
            score_pct,
            passing: score_pct >= self.passing_score,
            results,
        }
    }

    /// Answer key embedded into exported quiz pages for client-side grading
    pub fn answer_key(&self) -> AnswerKey {
        AnswerKey {
            quiz_id: self.id.clone(),
            passing_score: self.passing_score,
            questions: self
                .questions
                .iter()
                .map(|q| AnswerKeyEntry {
                    id: q.id.clone(),
                    correct: q.correct.clone(),
                    explanation: q.explanation.clone(),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerKey {
    pub quiz_id: String,
    pub passing_score: u32,
    pub questions: Vec<AnswerKeyEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerKeyEntry {
    pub id: String,
    pub correct: String,
    pub explanation: Option<String>,
}

/// Completion counts for one module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModuleProgress {
    pub done: usize,
    pub total: usize,
    pub pct: u32,
}

impl ModuleProgress {
    /// Count the module's lessons present in `completed` (lesson id strings)
    pub fn compute(module: &Module, completed: &HashSet<String>) -> Self {
        let total = module.lessons.len();
        let done = module
            .lesson_ids()
            .iter()
            .filter(|id| completed.contains(id.as_str()))
            .count();
        Self {
            done,
            total,
            pct: percent(done, total),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total > 0 && self.done == self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiz() -> Quiz {
        serde_yaml::from_str(
            r#"
id: basics
passing_score: 60
questions:
  - id: q1
    prompt: "First?"
    options: [{ key: a, text: A }, { key: b, text: B }]
    correct: b
  - id: q2
    prompt: "Second?"
    options: [{ key: a, text: A }, { key: c, text: C }]
    correct: c
    explanation: "Because C."
  - id: q3
    prompt: "Third?"
    correct: a
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_percent_truncates() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 66);
        assert_eq!(percent(3, 3), 100);
    }

    #[test]
    fn test_grade_counts_missing_answers_as_wrong() {
        let answers = HashMap::from([
            ("q1".to_string(), "b".to_string()),
            ("q2".to_string(), "a".to_string()),
        ]);
        let outcome = quiz().grade(&answers);

        assert_eq!(outcome.correct, 1);
        assert_eq!(outcome.total, 3);
        assert_eq!(outcome.score_pct, 33);
        assert!(!outcome.passing);
        assert_eq!(outcome.results[2].user_answer, "");
        assert_eq!(outcome.results[1].explanation.as_deref(), Some("Because C."));
    }

    #[test]
    fn test_grade_passing_threshold_is_inclusive() {
        let answers = HashMap::from([
            ("q1".to_string(), "b".to_string()),
            ("q2".to_string(), "c".to_string()),
        ]);
        let outcome = quiz().grade(&answers);
        assert_eq!(outcome.score_pct, 66);
        assert!(outcome.passing);
    }

    #[test]
    fn test_module_progress() {
        let module: Module = serde_yaml::from_str(
            "id: m\ntitle: M\nlessons:\n  - { slug: a, file: a.md }\n  - { slug: b, file: b.md }\n",
        )
        .unwrap();
        let completed = HashSet::from(["m::a".to_string(), "other::b".to_string()]);
        let progress = ModuleProgress::compute(&module, &completed);
        assert_eq!(progress, ModuleProgress { done: 1, total: 2, pct: 50 });
        assert!(!progress.is_complete());
    }
}
