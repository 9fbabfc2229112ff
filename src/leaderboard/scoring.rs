// src/leaderboard/scoring.rs

use crate::{
    config::{ASSIGNMENT_POINTS, CHALLENGE_POINTS, PROJECT_POINTS, QUIZ_POINTS_PER_CORRECT},
    models::{leaderboard::Breakdown, project::is_challenge, quiz::QuizQuestion},
};

/// A quiz attempt together with the questions of the quiz it answers.
#[derive(Debug, Clone, Default)]
pub struct AttemptRecord {
    pub answers: Vec<usize>,
    pub questions: Vec<QuizQuestion>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct AssignmentRecord {
    pub submission_ref: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectRecord {
    pub verified: bool,
    pub tags: Vec<String>,
}

/// Everything one user's score is derived from.
#[derive(Debug, Clone, Default)]
pub struct SourceRecords {
    pub attempts: Vec<AttemptRecord>,
    pub assignments: Vec<AssignmentRecord>,
    pub projects: Vec<ProjectRecord>,
}

/// Number of positions where the submitted index equals the stored correct
/// index. Answers past the last question are ignored.
pub fn count_correct(answers: &[usize], questions: &[QuizQuestion]) -> usize {
    answers
        .iter()
        .zip(questions)
        .filter(|(answer, question)| **answer == question.correct_index)
        .count()
}

/// Computes the category subtotals. Pure: the same records always give the
/// same breakdown.
pub fn compute_breakdown(sources: &SourceRecords) -> Breakdown {
    let correct: usize = sources
        .attempts
        .iter()
        .filter(|a| a.completed)
        .map(|a| count_correct(&a.answers, &a.questions))
        .sum();

    let submitted = sources
        .assignments
        .iter()
        .filter(|a| a.submission_ref.is_some())
        .count();

    let (challenges, projects): (Vec<&ProjectRecord>, Vec<&ProjectRecord>) = sources
        .projects
        .iter()
        .filter(|p| p.verified)
        .partition(|p| is_challenge(&p.tags));

    Breakdown {
        quizzes: correct as i64 * QUIZ_POINTS_PER_CORRECT,
        assignments: submitted as i64 * ASSIGNMENT_POINTS,
        projects: projects.len() as i64 * PROJECT_POINTS,
        challenges: challenges.len() as i64 * CHALLENGE_POINTS,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn questions(correct: &[usize]) -> Vec<QuizQuestion> {
        correct
            .iter()
            .enumerate()
            .map(|(i, &c)| QuizQuestion {
                question: format!("Question {}", i),
                options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
                correct_index: c,
                explanation: String::new(),
            })
            .collect()
    }

    /// A completed attempt on a ten-question quiz with `right` correct answers.
    pub(crate) fn attempt_scoring(right: usize, completed: bool) -> AttemptRecord {
        let key = vec![0; 10];
        let answers = (0..10).map(|i| if i < right { 0 } else { 1 }).collect();
        AttemptRecord {
            answers,
            questions: questions(&key),
            completed,
        }
    }

    #[test]
    fn test_no_records_scores_zero() {
        let b = compute_breakdown(&SourceRecords::default());
        assert_eq!(b, Breakdown::default());
        assert_eq!(b.total(), 0);
    }

    #[test]
    fn test_mixed_records() {
        let sources = SourceRecords {
            attempts: vec![attempt_scoring(8, true)],
            assignments: vec![AssignmentRecord {
                submission_ref: Some("https://files/a.zip".into()),
            }],
            projects: vec![ProjectRecord {
                verified: true,
                tags: vec!["web".into()],
            }],
        };
        let b = compute_breakdown(&sources);
        assert_eq!(
            b,
            Breakdown {
                quizzes: 8,
                assignments: 20,
                projects: 100,
                challenges: 0
            }
        );
        assert_eq!(b.total(), 128);
    }

    #[test]
    fn test_in_progress_attempts_do_not_count() {
        let sources = SourceRecords {
            attempts: vec![attempt_scoring(10, false), attempt_scoring(3, true)],
            ..Default::default()
        };
        assert_eq!(compute_breakdown(&sources).quizzes, 3);
    }

    #[test]
    fn test_unsubmitted_assignments_do_not_count() {
        let sources = SourceRecords {
            assignments: vec![
                AssignmentRecord { submission_ref: None },
                AssignmentRecord {
                    submission_ref: Some("https://x/1".into()),
                },
            ],
            ..Default::default()
        };
        assert_eq!(compute_breakdown(&sources).assignments, 20);
    }

    #[test]
    fn test_challenges_are_scored_separately() {
        let sources = SourceRecords {
            projects: vec![
                ProjectRecord {
                    verified: true,
                    tags: vec!["challenge".into()],
                },
                ProjectRecord {
                    verified: true,
                    tags: vec![],
                },
                ProjectRecord {
                    verified: false,
                    tags: vec!["challenge".into()],
                },
            ],
            ..Default::default()
        };
        let b = compute_breakdown(&sources);
        assert_eq!(b.projects, 100);
        assert_eq!(b.challenges, 80);
        assert_eq!(b.total(), 180);
    }

    #[test]
    fn test_count_correct_is_positional() {
        let qs = questions(&[0, 1, 2]);
        assert_eq!(count_correct(&[0, 1, 2], &qs), 3);
        assert_eq!(count_correct(&[2, 1, 0], &qs), 1);
        // Short answer lists only score what was answered; extras are ignored.
        assert_eq!(count_correct(&[0], &qs), 1);
        assert_eq!(count_correct(&[0, 1, 2, 3, 3], &qs), 3);
    }
}
