//! Text normalization shared by AMD keyword matching, objection matching,
//! and intent routing: lowercase, strip accents via NFD decomposition, and
//! collapse whitespace, so "¿Bueno?" and "bueno" compare equal.

use unicode_normalization::UnicodeNormalization;

pub fn normalize(input: &str) -> String {
    let folded: String = input
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_combining_mark(c: char) -> bool {
    matches!(c as u32, 0x0300..=0x036F)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_accents_and_case() {
        assert_eq!(normalize("¿Bueno?"), "¿bueno?");
        assert_eq!(normalize("Café"), "cafe");
    }

    #[test]
    fn collapses_internal_whitespace() {
        assert_eq!(normalize("  hola   mundo  "), "hola mundo");
    }
}
