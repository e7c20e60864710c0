use serde::Serialize;

use crate::model::ids::UserId;
use crate::model::score::Score;

pub const NOT_FOUND_MESSAGE: &str = "Score of this quiz has not been found.";
pub const ONLY_FINISHER_MESSAGE: &str = "You were the only person to finish this quiz yet.";

/// A user's standing among everyone who finished the same quiz.
///
/// `rank` is 1-based; 0 means the user has no score for the quiz.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ranking {
    pub rank: u32,
    pub percent: f64,
    pub message: String,
    #[serde(rename = "userScore")]
    pub score: Option<Score>,
}

impl Ranking {
    /// Rank `user_id` within `scores`, which must be sorted best first.
    ///
    /// The percent outperformed is derived from list position, not from score
    /// values: `(1 - rank / total) * 100`.
    #[must_use]
    pub fn for_user(user_id: UserId, scores: &[Score]) -> Self {
        let Some(position) = scores.iter().position(|s| s.user_id == user_id) else {
            return Self::not_found();
        };

        let rank = u32::try_from(position + 1).unwrap_or(u32::MAX);
        let percent = percent_outperformed(position + 1, scores.len());
        let message = if scores.len() == 1 {
            ONLY_FINISHER_MESSAGE.to_owned()
        } else {
            format!("You were better than {percent:.2}% of all quizzers")
        };

        Self {
            rank,
            percent,
            message,
            score: Some(scores[position].clone()),
        }
    }

    #[must_use]
    pub fn not_found() -> Self {
        Self {
            rank: 0,
            percent: 0.0,
            message: NOT_FOUND_MESSAGE.to_owned(),
            score: None,
        }
    }

    #[must_use]
    pub fn is_found(&self) -> bool {
        self.score.is_some()
    }
}

#[allow(clippy::cast_precision_loss)]
fn percent_outperformed(rank: usize, total: usize) -> f64 {
    (1.0 - rank as f64 / total as f64) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ids::{QuizId, ScoreId};
    use crate::time::fixed_now;

    fn score(id: u64, user: u64, value: f64) -> Score {
        Score {
            id: ScoreId::new(id),
            user_id: UserId::new(user),
            quiz_id: QuizId::new(1),
            value,
            created_at: fixed_now(),
        }
    }

    fn board() -> Vec<Score> {
        vec![score(1, 1, 0.9), score(2, 2, 0.7), score(3, 3, 0.5)]
    }

    #[test]
    fn middle_of_three() {
        let ranking = Ranking::for_user(UserId::new(2), &board());
        assert_eq!(ranking.rank, 2);
        assert!((ranking.percent - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(ranking.message, "You were better than 33.33% of all quizzers");
        assert_eq!(ranking.score.as_ref().map(|s| s.id), Some(ScoreId::new(2)));
    }

    #[test]
    fn last_place_beats_nobody() {
        let ranking = Ranking::for_user(UserId::new(3), &board());
        assert_eq!(ranking.rank, 3);
        assert!(ranking.percent.abs() < 1e-9);
        assert_eq!(ranking.message, "You were better than 0.00% of all quizzers");
    }

    #[test]
    fn only_finisher_gets_dedicated_message() {
        let ranking = Ranking::for_user(UserId::new(5), &[score(9, 5, 0.8)]);
        assert_eq!(ranking.rank, 1);
        assert!(ranking.percent.abs() < f64::EPSILON);
        assert_eq!(ranking.message, ONLY_FINISHER_MESSAGE);
        assert!(ranking.is_found());
    }

    #[test]
    fn missing_user_is_not_an_error() {
        let ranking = Ranking::for_user(UserId::new(42), &board());
        assert_eq!(ranking, Ranking::not_found());
        assert_eq!(ranking.rank, 0);
        assert!(ranking.score.is_none());
        assert_eq!(ranking.message, NOT_FOUND_MESSAGE);
    }

    #[test]
    fn first_of_many_uses_percent_message() {
        let ranking = Ranking::for_user(UserId::new(1), &board());
        assert_eq!(ranking.rank, 1);
        assert_eq!(ranking.message, "You were better than 66.67% of all quizzers");
    }

    #[test]
    fn repeat_finisher_ranks_on_best_row() {
        let scores = vec![score(4, 1, 1.0), score(1, 2, 0.9), score(2, 1, 0.1)];
        let ranking = Ranking::for_user(UserId::new(1), &scores);
        assert_eq!(ranking.rank, 1);
        assert_eq!(ranking.score.map(|s| s.id), Some(ScoreId::new(4)));
    }

    #[test]
    fn serializes_user_score_key() {
        let json = serde_json::to_value(Ranking::for_user(UserId::new(2), &board())).unwrap();
        assert_eq!(json["rank"], 2);
        assert_eq!(json["userScore"]["score"], 0.7);
        let missing = serde_json::to_value(Ranking::not_found()).unwrap();
        assert!(missing["userScore"].is_null());
    }
}
