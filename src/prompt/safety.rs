use once_cell::sync::Lazy;
use regex::Regex;

pub const ADULT_ATTRIBUTION: &str = ", worn by an adult woman";

static MINOR_CODED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)school uniform|seifuku|school(?-u:\b)").expect("valid pattern"));
static ADULT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)adult").expect("valid pattern"));
static REPEATED_WHITESPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("valid pattern"));

static REWRITES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"(?i)school uniform", "sailor-style outfit"),
        (r"(?i)seifuku", "adult sailor-inspired outfit"),
        (r"(?i)(?-u:\b)school(?-u:\b)", ""),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (
            Regex::new(pattern).expect("valid rewrite pattern"),
            replacement,
        )
    })
    .collect()
});

pub fn is_minor_coded(text: &str) -> bool {
    MINOR_CODED.is_match(text)
}

pub fn rewrite_attire(text: &str) -> String {
    let trimmed = text.trim();
    if !is_minor_coded(trimmed) {
        return trimmed.to_string();
    }

    let mut rewritten = trimmed.to_string();
    for (pattern, replacement) in REWRITES.iter() {
        rewritten = pattern.replace_all(&rewritten, *replacement).into_owned();
    }
    let mut rewritten = REPEATED_WHITESPACE
        .replace_all(&rewritten, " ")
        .trim()
        .to_string();

    if !ADULT_MARKER.is_match(&rewritten) {
        rewritten.push_str(ADULT_ATTRIBUTION);
    }
    rewritten
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seifuku_school_uniform_becomes_adult_sailor_outfit() {
        let rewritten = rewrite_attire(
            "wearing a high-quality seifuku school uniform, navy blue sailor collar",
        );
        assert_eq!(
            rewritten,
            "wearing a high-quality adult sailor-inspired outfit sailor-style outfit, navy blue sailor collar"
        );
        assert!(!rewritten.to_lowercase().contains("school uniform"));
        assert!(!rewritten.to_lowercase().contains("seifuku"));
    }

    #[test]
    fn standalone_school_is_removed_and_adult_marker_added() {
        let rewritten =
            rewrite_attire("wearing a classic dark blue japanese School swimsuit (sukumizu)");
        assert_eq!(
            rewritten,
            "wearing a classic dark blue japanese swimsuit (sukumizu), worn by an adult woman"
        );
    }

    #[test]
    fn school_uniform_alone_gets_attribution() {
        assert_eq!(
            rewrite_attire("a pleated School Uniform"),
            "a pleated sailor-style outfit, worn by an adult woman"
        );
    }

    #[test]
    fn school_next_to_non_ascii_text_is_removed() {
        assert!(is_minor_coded("学校school swimsuit"));
        assert_eq!(
            rewrite_attire("学校school swimsuit"),
            "学校 swimsuit, worn by an adult woman"
        );
        assert_eq!(
            rewrite_attire("navy schoolé swimsuit"),
            "navy é swimsuit, worn by an adult woman"
        );
    }

    #[test]
    fn unrelated_attire_is_only_trimmed() {
        assert_eq!(
            rewrite_attire("  wearing a victorian maid outfit "),
            "wearing a victorian maid outfit"
        );
        assert!(!is_minor_coded("schoolyard romance"));
    }
}
