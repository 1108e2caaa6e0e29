use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::question::Question;
use crate::models::student_answer::StudentAnswer;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GradedAnswer {
    pub question_id: Uuid,
    pub is_correct: bool,
}

#[derive(Debug, Clone)]
pub struct Grade {
    pub score: i32,
    pub graded: Vec<GradedAnswer>,
}

pub struct ScoringService;

impl ScoringService {
    /// Grades recorded selections against the exam's answer key. Unanswered
    /// questions contribute nothing; an answer whose question no longer
    /// exists grades as incorrect with zero marks.
    pub fn grade(questions: &[Question], answers: &[StudentAnswer]) -> Grade {
        let mut score = 0;
        let mut graded = Vec::with_capacity(answers.len());

        for ans in answers {
            let key = questions
                .iter()
                .find(|q| q.id == ans.question_id)
                .map(|q| (q.correct_answer == ans.selected_answer, q.marks));

            let is_correct = match key {
                Some((true, marks)) => {
                    score += marks;
                    true
                }
                _ => false,
            };

            graded.push(GradedAnswer {
                question_id: ans.question_id,
                is_correct,
            });
        }

        Grade { score, graded }
    }

    /// `100 * score / total_marks`, rounded to two places; exactly zero for
    /// an exam with no marks.
    pub fn percentage(score: i32, total_marks: i32) -> Decimal {
        if total_marks <= 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(score) * Decimal::from(100) / Decimal::from(total_marks)).round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::AnswerChoice;
    use chrono::Utc;

    fn question(exam_id: Uuid, correct: AnswerChoice, marks: i32) -> Question {
        Question {
            id: Uuid::new_v4(),
            exam_id,
            question_text: "2 + 2 = ?".into(),
            option_a: "3".into(),
            option_b: "4".into(),
            option_c: "5".into(),
            option_d: "6".into(),
            correct_answer: correct,
            marks,
            order_number: 1,
            created_at: Utc::now(),
        }
    }

    fn answer(attempt_id: Uuid, question_id: Uuid, selected: AnswerChoice) -> StudentAnswer {
        StudentAnswer {
            id: Uuid::new_v4(),
            attempt_id,
            question_id,
            selected_answer: selected,
            is_correct: None,
            answered_at: Utc::now(),
        }
    }

    #[test]
    fn correct_selection_earns_full_marks() {
        let exam_id = Uuid::new_v4();
        let attempt_id = Uuid::new_v4();
        let q = question(exam_id, AnswerChoice::B, 10);
        let grade = ScoringService::grade(
            &[q.clone()],
            &[answer(attempt_id, q.id, AnswerChoice::B)],
        );
        assert_eq!(grade.score, 10);
        assert!(grade.graded[0].is_correct);
        assert_eq!(
            ScoringService::percentage(grade.score, 10),
            Decimal::from(100)
        );
    }

    #[test]
    fn wrong_selection_earns_nothing() {
        let exam_id = Uuid::new_v4();
        let attempt_id = Uuid::new_v4();
        let q = question(exam_id, AnswerChoice::B, 10);
        let grade = ScoringService::grade(
            &[q.clone()],
            &[answer(attempt_id, q.id, AnswerChoice::A)],
        );
        assert_eq!(grade.score, 0);
        assert!(!grade.graded[0].is_correct);
        assert_eq!(ScoringService::percentage(grade.score, 10), Decimal::ZERO);
    }

    #[test]
    fn unanswered_questions_do_not_score() {
        let exam_id = Uuid::new_v4();
        let attempt_id = Uuid::new_v4();
        let q1 = question(exam_id, AnswerChoice::C, 3);
        let q2 = question(exam_id, AnswerChoice::D, 5);
        let grade = ScoringService::grade(
            &[q1.clone(), q2],
            &[answer(attempt_id, q1.id, AnswerChoice::C)],
        );
        assert_eq!(grade.score, 3);
        assert_eq!(grade.graded.len(), 1);
    }

    #[test]
    fn grading_twice_yields_same_result() {
        let exam_id = Uuid::new_v4();
        let attempt_id = Uuid::new_v4();
        let q1 = question(exam_id, AnswerChoice::A, 2);
        let q2 = question(exam_id, AnswerChoice::B, 4);
        let questions = vec![q1.clone(), q2.clone()];
        let answers = vec![
            answer(attempt_id, q1.id, AnswerChoice::A),
            answer(attempt_id, q2.id, AnswerChoice::C),
        ];
        let first = ScoringService::grade(&questions, &answers);
        let second = ScoringService::grade(&questions, &answers);
        assert_eq!(first.score, second.score);
        assert_eq!(first.graded, second.graded);
    }

    #[test]
    fn percentage_guards_zero_total() {
        assert_eq!(ScoringService::percentage(0, 0), Decimal::ZERO);
        assert_eq!(ScoringService::percentage(5, 0), Decimal::ZERO);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        use rust_decimal::prelude::ToPrimitive;
        let pct = ScoringService::percentage(7, 9);
        let as_f64 = pct.to_f64().unwrap();
        assert!(as_f64 > 0.0 && as_f64 < 100.0);
        assert_eq!(pct, Decimal::new(7778, 2));
    }
}
