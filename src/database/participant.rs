use std::fmt;

/// A row of the `"USERS"` table. `scores` stays empty until the quiz is finished.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Participant {
    pub phone: String,
    pub name: String,
    pub scores: Option<i32>,
}

impl fmt::Display for Participant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scores {
            Some(score) => write!(f, "{} ({}): {} pontos", self.name, self.phone, score),
            None => write!(f, "{} ({})", self.name, self.phone),
        }
    }
}
