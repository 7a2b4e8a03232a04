//! Deterministic settlement name generation from curated syllable lists.
//!
//! Same RNG stream = same names.

use crate::rng::SubsystemRng;

pub struct NameGenerator;

impl NameGenerator {
    /// "Ash" + "ford" → "Ashford".
    pub fn settlement_name(rng: &mut SubsystemRng) -> String {
        let stem = Self::stems()[rng.below(Self::stems().len())];
        let ending = Self::endings()[rng.below(Self::endings().len())];
        format!("{stem}{ending}")
    }

    fn stems() -> &'static [&'static str] {
        &[
            "Ash", "Bel", "Black", "Bright", "Cald", "Cold", "Crow", "Dun",
            "East", "Elm", "Fair", "Fern", "Glen", "Gold", "Grey", "Hal",
            "Hart", "High", "Iron", "King", "Lang", "Mar", "Mill", "North",
            "Oak", "Red", "Ross", "Salt", "Stan", "Stone", "Thorn", "West",
        ]
    }

    fn endings() -> &'static [&'static str] {
        &[
            "bridge", "brook", "bury", "by", "dale", "field", "ford", "gate",
            "ham", "haven", "hill", "holm", "mere", "mouth", "port", "stead",
            "ton", "wick", "wood", "worth",
        ]
    }
}
