use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton, KeyboardMarkup};
use uuid::Uuid;

use crate::{
    engine::{Selection, Verdict},
    quiz::Question,
    session::QuestionTag,
};

pub(crate) const PLAY: &str = "Play";
const NEXT: &str = "next";
const OPTION: &str = "option";

/// What an inline button press on a question message asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuizAction {
    Select(usize),
    Next,
}

/// A button press together with the run and question its keyboard was drawn for.
///
/// Callback data reads `option:{run}:{question}:{option}` or `next:{run}:{question}`,
/// the run id in its 32-digit simple form. That stays well inside Telegram's 64 bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct QuizPress {
    pub(crate) tag: QuestionTag,
    pub(crate) action: QuizAction,
}

impl QuizPress {
    pub(crate) fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let kind = parts.next()?;
        let run_id = Uuid::parse_str(parts.next()?).ok()?;
        let index = parts.next()?.parse().ok()?;

        let action = match (kind, parts.next()) {
            (OPTION, Some(option)) => QuizAction::Select(option.parse().ok()?),
            (NEXT, None) => QuizAction::Next,
            _ => return None,
        };
        if parts.next().is_some() {
            return None;
        }

        Some(Self {
            tag: QuestionTag { run_id, index },
            action,
        })
    }

    pub(crate) fn data(&self) -> String {
        let QuestionTag { run_id, index } = self.tag;
        match self.action {
            QuizAction::Select(option) => format!("{OPTION}:{}:{index}:{option}", run_id.simple()),
            QuizAction::Next => format!("{NEXT}:{}:{index}", run_id.simple()),
        }
    }
}

fn button(label: impl Into<String>, tag: QuestionTag, action: QuizAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label, QuizPress { tag, action }.data())
}

pub(crate) fn play_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new(vec![vec![KeyboardButton::new(PLAY)]])
}

pub(crate) fn options_keyboard(tag: QuestionTag, question: &Question) -> InlineKeyboardMarkup {
    let buttons: Vec<InlineKeyboardButton> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| button(*option, tag, QuizAction::Select(i)))
        .collect();

    InlineKeyboardMarkup::new(buttons.chunks(2).map(|row| row.to_vec()))
}

/// Options marked with the outcome, plus the button to move on.
pub(crate) fn answered_keyboard(
    tag: QuestionTag,
    question: &Question,
    verdict: &Verdict,
) -> InlineKeyboardMarkup {
    let chosen = match verdict.selection {
        Selection::Option(i) => Some(i),
        Selection::TimedOut => None,
    };

    let buttons: Vec<InlineKeyboardButton> = question
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let label = if question.is_correct(i) {
                format!("✅ {option}")
            } else if chosen == Some(i) {
                format!("❌ {option}")
            } else {
                option.to_string()
            };
            button(label, tag, QuizAction::Select(i))
        })
        .collect();

    let mut rows: Vec<Vec<InlineKeyboardButton>> =
        buttons.chunks(2).map(|row| row.to_vec()).collect();
    rows.push(vec![button("Próxima", tag, QuizAction::Next)]);

    InlineKeyboardMarkup::new(rows)
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::quiz::bank;

    fn tag() -> QuestionTag {
        QuestionTag {
            run_id: Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef),
            index: 3,
        }
    }

    fn callback_data(button: &InlineKeyboardButton) -> &str {
        match &button.kind {
            InlineKeyboardButtonKind::CallbackData(data) => data,
            other => panic!("not a callback button: {other:?}"),
        }
    }

    #[test]
    fn parses_callback_data() {
        let run = "0123456789abcdef0123456789abcdef";

        assert_eq!(
            QuizPress::parse(&format!("option:{run}:3:2")),
            Some(QuizPress {
                tag: tag(),
                action: QuizAction::Select(2)
            })
        );
        assert_eq!(
            QuizPress::parse(&format!("next:{run}:3")),
            Some(QuizPress {
                tag: tag(),
                action: QuizAction::Next
            })
        );
        assert_eq!(QuizPress::parse(&format!("option:{run}:3")), None);
        assert_eq!(QuizPress::parse(&format!("next:{run}:3:1")), None);
        assert_eq!(QuizPress::parse(&format!("option:{run}:3:x")), None);
        assert_eq!(QuizPress::parse("option:2"), None);
        assert_eq!(QuizPress::parse("next"), None);
        assert_eq!(QuizPress::parse("Take a quiz"), None);
    }

    #[test]
    fn callback_data_fits_telegram_limit() {
        let press = QuizPress {
            tag: QuestionTag {
                run_id: Uuid::new_v4(),
                index: 7,
            },
            action: QuizAction::Select(3),
        };

        let data = press.data();
        assert!(data.len() <= 64);
        assert_eq!(QuizPress::parse(&data), Some(press));
    }

    #[test]
    fn options_are_laid_out_two_by_two() {
        let keyboard = options_keyboard(tag(), &bank()[0]);

        assert_eq!(keyboard.inline_keyboard.len(), 2);
        assert!(keyboard.inline_keyboard.iter().all(|row| row.len() == 2));
        assert_eq!(keyboard.inline_keyboard[0][0].text, "Londres");
        assert_eq!(
            callback_data(&keyboard.inline_keyboard[1][1]),
            "option:0123456789abcdef0123456789abcdef:3:3"
        );
    }

    #[test]
    fn answered_keyboard_marks_choice_and_adds_next() {
        let question = &bank()[0];
        let verdict = Verdict {
            selection: Selection::Option(1),
            correct: false,
            earned: 0,
        };
        let keyboard = answered_keyboard(tag(), question, &verdict);

        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[0][0].text, "✅ Londres");
        assert_eq!(keyboard.inline_keyboard[0][1].text, "❌ Paris");
        assert_eq!(keyboard.inline_keyboard[2][0].text, "Próxima");
        assert_eq!(
            callback_data(&keyboard.inline_keyboard[2][0]),
            "next:0123456789abcdef0123456789abcdef:3"
        );
    }
}
