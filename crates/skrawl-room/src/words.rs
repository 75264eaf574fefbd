//! Built-in word banks, used when a room has no `custom_words` override.

use skrawl_protocol::Language;

const ENGLISH: &[&str] = &[
    "apple", "banana", "guitar", "elephant", "bicycle", "rainbow", "castle", "volcano",
    "butterfly", "telescope", "sandwich", "umbrella", "dinosaur", "mountain", "spaceship",
    "waterfall", "backpack", "dragon", "lighthouse", "pancake", "skateboard", "snowman",
    "treasure", "whistle", "octopus", "penguin", "campfire", "helicopter", "kangaroo",
    "pirate", "robot", "submarine", "tornado", "volleyball", "wizard", "zebra", "anchor",
    "balloon", "cactus", "diamond",
];

const SPANISH: &[&str] = &[
    "manzana", "platano", "guitarra", "elefante", "bicicleta", "arcoiris", "castillo",
    "volcan", "mariposa", "telescopio", "sandwich", "paraguas", "dinosaurio", "montana",
    "cohete", "cascada", "mochila", "dragon", "faro", "panqueque", "patineta", "munieco",
    "tesoro", "silbato", "pulpo", "pinguino", "fogata", "helicoptero", "canguro",
    "pirata", "robot", "submarino", "tornado", "voleibol", "mago", "cebra", "ancla",
    "globo", "cactus", "diamante",
];

pub fn bank_for(language: Language) -> &'static [&'static str] {
    match language {
        Language::English => ENGLISH,
        Language::Spanish => SPANISH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_bank_has_enough_words_for_three_choices() {
        assert!(bank_for(Language::English).len() >= 3);
        assert!(bank_for(Language::Spanish).len() >= 3);
    }

    #[test]
    fn test_banks_contain_no_duplicates() {
        for bank in [bank_for(Language::English), bank_for(Language::Spanish)] {
            let unique: std::collections::HashSet<_> = bank.iter().collect();
            assert_eq!(unique.len(), bank.len());
        }
    }
}
