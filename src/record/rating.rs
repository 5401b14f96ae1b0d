use std::fmt;

/// Star rating of a catalogue entry
///
/// The catalogue encodes ratings as a class token spelling the number
/// (`star-rating Three`). Anything outside One..Five becomes `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rating {
    Stars(u8),
    Unknown,
}

const WORDS: [(&str, u8); 5] = [("one", 1), ("two", 2), ("three", 3), ("four", 4), ("five", 5)];

impl Rating {
    /// Maps a single word token to a rating
    pub fn from_word(word: &str) -> Self {
        let word = word.trim().to_ascii_lowercase();
        WORDS
            .iter()
            .find(|(w, _)| *w == word)
            .map(|(_, n)| Self::Stars(*n))
            .unwrap_or(Self::Unknown)
    }

    /// Scans a list of class tokens for the first one naming a rating
    pub fn from_class_tokens<'a>(tokens: impl IntoIterator<Item = &'a str>) -> Self {
        tokens
            .into_iter()
            .map(Self::from_word)
            .find(|r| !r.is_unknown())
            .unwrap_or(Self::Unknown)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Integer column value; unknown ratings are written as 0
    pub fn as_column(&self) -> u8 {
        match self {
            Self::Stars(n) => *n,
            Self::Unknown => 0,
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stars(n) => write!(f, "{}", n),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}
