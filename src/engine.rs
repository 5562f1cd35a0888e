//! Per-question countdown and time-weighted scoring.
//!
//! A session walks the question bank through three phases:
//!
//! - `Counting`: the countdown ratio drops from [`FULL_TIME`] by [`TICK_STEP`] on every tick.
//! - `Answered`: an option was chosen, or the ratio hit zero (scored as a miss).
//! - `Finished`: the last question was advanced past.
//!
//! A correct answer is worth [`points_for`] the ratio at the moment of selection.

use crate::quiz::{Question, OPTION_COUNT};

pub const FULL_TIME: f64 = 100.0;
pub const TICK_STEP: f64 = 1.67;
pub const BASE_POINTS: u32 = 20;
pub const SPEED_BONUS: f64 = 30.0;

/// `20 + round(ratio / 100 * 30)`, so 20 at the buzzer and 50 for an instant answer.
pub fn points_for(ratio: f64) -> u32 {
    let ratio = ratio.clamp(0.0, FULL_TIME);
    BASE_POINTS + (ratio / FULL_TIME * SPEED_BONUS).round() as u32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Option(usize),
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub selection: Selection,
    pub correct: bool,
    pub earned: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Counting,
    Answered(Verdict),
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tick {
    Running { ratio: f64 },
    Expired,
    /// Nothing is counting down.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Next { index: usize },
    Finished { score: u32 },
    Ignored,
}

#[derive(Debug, Clone)]
pub struct QuizSession<'q> {
    questions: &'q [Question],
    current: usize,
    ratio: f64,
    phase: Phase,
    score: u32,
}

impl<'q> QuizSession<'q> {
    pub fn new(questions: &'q [Question]) -> Self {
        let phase = if questions.is_empty() {
            Phase::Finished
        } else {
            Phase::Counting
        };

        Self {
            questions,
            current: 0,
            ratio: FULL_TIME,
            phase,
            score: 0,
        }
    }

    pub fn tick(&mut self) -> Tick {
        if self.phase != Phase::Counting {
            return Tick::Idle;
        }

        self.ratio = (self.ratio - TICK_STEP).max(0.0);
        if self.ratio > 0.0 {
            return Tick::Running { ratio: self.ratio };
        }

        self.phase = Phase::Answered(Verdict {
            selection: Selection::TimedOut,
            correct: false,
            earned: 0,
        });
        Tick::Expired
    }

    /// Records the user's choice. `None` when the question is no longer counting down
    /// or the option does not exist.
    pub fn select(&mut self, option: usize) -> Option<Verdict> {
        if self.phase != Phase::Counting || option >= OPTION_COUNT {
            return None;
        }

        let correct = self.questions[self.current].is_correct(option);
        let earned = if correct { points_for(self.ratio) } else { 0 };
        self.score += earned;

        let verdict = Verdict {
            selection: Selection::Option(option),
            correct,
            earned,
        };
        self.phase = Phase::Answered(verdict);

        Some(verdict)
    }

    pub fn advance(&mut self) -> Advance {
        if !matches!(self.phase, Phase::Answered(_)) {
            return Advance::Ignored;
        }

        if self.current + 1 >= self.questions.len() {
            self.phase = Phase::Finished;
            return Advance::Finished { score: self.score };
        }

        self.current += 1;
        self.ratio = FULL_TIME;
        self.phase = Phase::Counting;
        Advance::Next {
            index: self.current,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question(&self) -> Option<&'q Question> {
        self.questions.get(self.current)
    }

    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn total(&self) -> usize {
        self.questions.len()
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static QUESTIONS: [Question; 2] = [
        Question {
            prompt: "first",
            image: "/images/first.jpg",
            options: ["a", "b", "c", "d"],
            answer: 1,
        },
        Question {
            prompt: "second",
            image: "/images/second.jpg",
            options: ["a", "b", "c", "d"],
            answer: 3,
        },
    ];

    #[test]
    fn points_follow_the_speed_bonus() {
        assert_eq!(points_for(100.0), 50);
        assert_eq!(points_for(0.0), 20);
        assert_eq!(points_for(50.0), 35);
        // 98.33 * 0.3 = 29.499
        assert_eq!(points_for(100.0 - TICK_STEP), 49);
        assert_eq!(points_for(150.0), 50);
        assert_eq!(points_for(-3.0), 20);

        let mut ratio = 0.0;
        while ratio <= FULL_TIME {
            let points = points_for(ratio);
            assert!((20..=50).contains(&points), "{ratio} -> {points}");
            ratio += 0.5;
        }
    }

    #[test]
    fn instant_correct_answer_scores_fifty() {
        let mut session = QuizSession::new(&QUESTIONS);
        let verdict = session.select(1).unwrap();

        assert!(verdict.correct);
        assert_eq!(verdict.earned, 50);
        assert_eq!(session.score(), 50);
    }

    #[test]
    fn wrong_answer_scores_nothing() {
        let mut session = QuizSession::new(&QUESTIONS);
        let verdict = session.select(0).unwrap();

        assert!(!verdict.correct);
        assert_eq!(verdict.earned, 0);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn countdown_expires_after_sixty_ticks() {
        let mut session = QuizSession::new(&QUESTIONS);

        for _ in 0..59 {
            assert!(matches!(session.tick(), Tick::Running { .. }));
        }
        assert_eq!(session.tick(), Tick::Expired);
        assert_eq!(session.ratio(), 0.0);
        assert_eq!(
            session.phase(),
            Phase::Answered(Verdict {
                selection: Selection::TimedOut,
                correct: false,
                earned: 0,
            })
        );
        assert_eq!(session.tick(), Tick::Idle);
    }

    #[test]
    fn selection_after_expiry_is_ignored() {
        let mut session = QuizSession::new(&QUESTIONS);
        while session.tick() != Tick::Expired {}

        assert_eq!(session.select(1), None);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn second_selection_is_ignored() {
        let mut session = QuizSession::new(&QUESTIONS);
        session.select(0).unwrap();

        assert_eq!(session.select(1), None);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut session = QuizSession::new(&QUESTIONS);

        assert_eq!(session.select(OPTION_COUNT), None);
        assert_eq!(session.phase(), Phase::Counting);
    }

    #[test]
    fn advance_requires_an_answer() {
        let mut session = QuizSession::new(&QUESTIONS);
        assert_eq!(session.advance(), Advance::Ignored);
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn advance_resets_the_countdown() {
        let mut session = QuizSession::new(&QUESTIONS);
        session.tick();
        session.tick();
        session.select(1).unwrap();

        assert_eq!(session.advance(), Advance::Next { index: 1 });
        assert_eq!(session.ratio(), FULL_TIME);
        assert_eq!(session.phase(), Phase::Counting);
        assert_eq!(session.question().unwrap().prompt, "second");
    }

    #[test]
    fn last_advance_finishes_exactly_once() {
        let mut session = QuizSession::new(&QUESTIONS);
        session.select(1).unwrap();
        session.advance();
        while session.tick() != Tick::Expired {}

        assert_eq!(session.advance(), Advance::Finished { score: 50 });
        assert!(session.is_finished());
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.advance(), Advance::Ignored);
        assert_eq!(session.tick(), Tick::Idle);
        assert_eq!(session.select(3), None);
    }

    #[test]
    fn correct_answer_at_the_buzzer_scores_twenty() {
        let mut session = QuizSession::new(&QUESTIONS);
        session.ratio = 0.0;

        assert_eq!(session.select(1).unwrap().earned, 20);
    }

    #[test]
    fn empty_bank_starts_finished() {
        let mut session = QuizSession::new(&[]);

        assert!(session.is_finished());
        assert_eq!(session.question(), None);
        assert_eq!(session.advance(), Advance::Ignored);
    }
}
