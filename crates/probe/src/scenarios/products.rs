//! Search terms paired with their translation.

use rand::seq::SliceRandom;
use rand::Rng;

/// Product title and its equivalent in the other language
pub type ProductPair = (&'static str, &'static str);

const PAIRS: [ProductPair; 6] = [
    ("Harry Potter", "Гарри Поттер"),
    ("Властелин Колец", "The Lord of The Ring"),
    ("Diablo", "Диабло"),
    ("Ведьмак", "Witcher"),
    ("Warcraft", "Варкрафт"),
    ("Игра престолов", "Game of Thrones"),
];

/// Bilingual search terms used by the search and cart scenarios
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductDictionary;

impl ProductDictionary {
    /// Every pair
    #[must_use]
    pub const fn pairs(&self) -> &'static [ProductPair] {
        &PAIRS
    }

    /// Random pair
    #[must_use]
    pub fn choose(&self) -> ProductPair {
        self.choose_with(&mut rand::thread_rng())
    }

    /// Random pair from `rng`
    #[must_use]
    pub fn choose_with<R: Rng + ?Sized>(&self, rng: &mut R) -> ProductPair {
        // PAIRS is non-empty
        PAIRS.choose(rng).copied().unwrap_or(PAIRS[0])
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_dictionary_contents() {
        let dict = ProductDictionary;
        assert_eq!(dict.pairs().len(), 6);
        assert!(dict.pairs().contains(&("Diablo", "Диабло")));
    }

    #[test]
    fn test_choice_is_from_dictionary() {
        let dict = ProductDictionary;
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..20 {
            assert!(dict.pairs().contains(&dict.choose_with(&mut rng)));
        }
        assert!(dict.pairs().contains(&dict.choose()));
    }
}
