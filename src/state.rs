use crate::phone::Phone;

#[derive(Debug, Clone, Default)]
pub enum QuizState {
    #[default]
    Start,

    // PART FOR --- REGISTRATION ---
    ReceiveName,
    ReceivePhone {
        name: String,
    },
    Registered {
        phone: Phone,
    },

    // PART FOR --- RUNNING QUIZ ---
    Playing,
    Done {
        score: u32,
    },
}
