//! General-knowledge question bank for the tower game

use serde::{Deserialize, Serialize};

/// Question category offered by the tower game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Animals,
    Geography,
    Science,
    Nature,
    Professions,
    Culture,
    Daily,
    /// Every category shuffled together
    #[default]
    Mixed,
}

impl Category {
    pub const ALL: [Category; 8] = [
        Category::Animals,
        Category::Geography,
        Category::Science,
        Category::Nature,
        Category::Professions,
        Category::Culture,
        Category::Daily,
        Category::Mixed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Animals => "animals",
            Category::Geography => "geography",
            Category::Science => "science",
            Category::Nature => "nature",
            Category::Professions => "professions",
            Category::Culture => "culture",
            Category::Daily => "daily",
            Category::Mixed => "mixed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|c| c.as_str() == s)
    }

    /// Block colour for the category
    pub fn css(&self) -> &'static str {
        match self {
            Category::Animals => "#4CAF50",
            Category::Geography => "#2196F3",
            Category::Science => "#9C27B0",
            Category::Nature => "#8BC34A",
            Category::Professions => "#FF9800",
            Category::Culture => "#E91E63",
            Category::Daily => "#FFC107",
            Category::Mixed => "#95A5A6",
        }
    }

    fn includes(&self, other: Category) -> bool {
        *self == Category::Mixed || *self == other
    }
}

/// One multiple-choice question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub category: Category,
    pub text: &'static str,
    pub answers: &'static [&'static str],
    /// Index into `answers`
    pub correct: usize,
}

const fn q(
    category: Category,
    text: &'static str,
    answers: &'static [&'static str],
    correct: usize,
) -> Question {
    Question {
        category,
        text,
        answers,
        correct,
    }
}

use Category::*;

pub static QUESTIONS: &[Question] = &[
    q(Animals, "Which animal is the largest?", &["Elephant", "Blue whale", "Giraffe"], 1),
    q(Animals, "How many legs does a spider have?", &["6", "8", "10", "4"], 1),
    q(Animals, "Which animal can fly?", &["Penguin", "Ostrich", "Bat"], 2),
    q(Animals, "What do bees make?", &["Milk", "Honey", "Silk"], 1),
    q(Geography, "What is the largest ocean?", &["Atlantic", "Indian", "Pacific", "Arctic"], 2),
    q(Geography, "On which continent is Egypt?", &["Africa", "Asia", "Europe"], 0),
    q(Geography, "What is the longest river in South America?", &["Nile", "Amazon", "Danube"], 1),
    q(Science, "Which planet is closest to the Sun?", &["Venus", "Mars", "Mercury", "Earth"], 2),
    q(Science, "Water freezes at how many degrees Celsius?", &["0", "10", "100"], 0),
    q(Science, "What gas do plants take in?", &["Oxygen", "Carbon dioxide", "Helium"], 1),
    q(Nature, "What do caterpillars turn into?", &["Butterflies", "Spiders", "Beetles"], 0),
    q(Nature, "Which season comes after winter?", &["Autumn", "Summer", "Spring"], 2),
    q(Nature, "What do trees lose in autumn?", &["Roots", "Leaves", "Bark"], 1),
    q(Professions, "Who puts out fires?", &["Firefighter", "Baker", "Pilot"], 0),
    q(Professions, "Who flies airplanes?", &["Sailor", "Pilot", "Farmer"], 1),
    q(Professions, "Who looks after sick animals?", &["Dentist", "Chef", "Vet"], 2),
    q(Culture, "How many strings does a violin have?", &["4", "6", "3"], 0),
    q(Culture, "Who painted the Mona Lisa?", &["Picasso", "Van Gogh", "Leonardo da Vinci"], 2),
    q(Culture, "How many players are on a football team on the pitch?", &["9", "11", "7"], 1),
    q(Daily, "How many hours are in a day?", &["12", "24", "36"], 1),
    q(Daily, "Which meal do we eat in the morning?", &["Dinner", "Lunch", "Breakfast"], 2),
    q(Daily, "How many days are in a week?", &["5", "7", "10"], 1),
];

/// Indices into [`QUESTIONS`] belonging to `category`
pub fn indices(category: Category) -> Vec<usize> {
    QUESTIONS
        .iter()
        .enumerate()
        .filter(|(_, question)| category.includes(question.category))
        .map(|(i, _)| i)
        .collect()
}
