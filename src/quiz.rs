use std::{
    fmt,
    path::{Path, PathBuf},
};

pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub prompt: &'static str,
    pub image: &'static str,
    pub options: [&'static str; OPTION_COUNT],
    pub answer: usize,
}

impl Question {
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.answer
    }

    pub fn correct_option(&self) -> &'static str {
        self.options[self.answer]
    }

    /// Resolves the image reference against a local assets directory.
    pub fn image_path(&self, assets_dir: &Path) -> PathBuf {
        assets_dir.join(self.image.trim_start_matches('/'))
    }
}

impl fmt::Display for Question {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<b>{}</b>", self.prompt)
    }
}

static QUESTIONS: [Question; 8] = [
    Question {
        prompt: "Qual é a capital da Inglaterra?",
        image: "/images/londres.jpg",
        options: ["Londres", "Paris", "Berlim", "Roma"],
        answer: 0,
    },
    Question {
        prompt: "Quem escreveu 'Romeu e Julieta'?",
        image: "/images/romeu-and-julieta.jpg",
        options: ["Austen", "Dickens", "Tolkien", "Shakespeare"],
        answer: 3,
    },
    Question {
        prompt: "Qual país inventou o futebol moderno?",
        image: "/images/totao.jpg",
        options: ["Inglaterra", "Brasil", "Alemanha", "Argentina"],
        answer: 0,
    },
    Question {
        prompt: "Qual é o famoso relógio de Londres?",
        image: "/images/big-ben.jpg",
        options: ["Big Ben", "Tower Bridge", "London Eye", "Buckingham Palace"],
        answer: 0,
    },
    Question {
        prompt: "Qual desses é um prato típico inglês?",
        image: "/images/comida.jpg",
        options: ["Sushi", "Tacos", "Fish and Chips", "Curry"],
        answer: 2,
    },
    Question {
        prompt: "Como se chama a moeda usada na Inglaterra?",
        image: "/images/moeda.jpg",
        options: ["Dólar", "Euro", "Libra Esterlina", "Iene"],
        answer: 2,
    },
    Question {
        prompt: "Qual é o nome do famoso palácio onde vive o rei/monarca da Inglaterra?",
        image: "/images/palacio.jpg",
        options: [
            "Buckingham Palace",
            "Windsor Castle",
            "Kensington Palace",
            "St. James's Palace",
        ],
        answer: 0,
    },
    Question {
        prompt: "Quem criou a história do Harry Potter?",
        image: "/images/harrypotter.jpg",
        options: [
            "J.R.R. Tolkien",
            "Rick Riordan",
            "J.K. Rowling",
            "Suzanne Collins",
        ],
        answer: 2,
    },
];

pub fn bank() -> &'static [Question] {
    &QUESTIONS
}
