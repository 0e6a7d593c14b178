//! Slug derivation and join-code generation for new programs.

use rand::rngs::OsRng;
use rand::Rng;

/// Join codes are secrets, unlike slugs which are public and predictable, so
/// they are drawn from the OS random source rather than a seeded generator.
const JOIN_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const JOIN_CODE_LEN: usize = 8;

/// Lowercase ASCII slugification: alphanumerics pass through, runs of
/// anything else collapse to a single hyphen, no leading/trailing hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    if slug.is_empty() {
        // A name made entirely of punctuation still needs a routable slug.
        "program".to_string()
    } else {
        slug
    }
}

/// First-fit linear probe over the derived slug: "name", "name-1", "name-2",
/// until `taken` reports a free one.
pub fn unique_slug<E>(name: &str, mut taken: impl FnMut(&str) -> Result<bool, E>) -> Result<String, E> {
    let base = slugify(name);
    let mut slug = base.clone();
    let mut counter = 1u32;

    while taken(&slug)? {
        slug = format!("{base}-{counter}");
        counter += 1;
    }

    Ok(slug)
}

/// Generate an 8-character uppercase-alphanumeric join code from the OS
/// CSPRNG.
pub fn generate_join_code() -> String {
    let mut rng = OsRng;
    (0..JOIN_CODE_LEN)
        .map(|_| {
            let index = rng.gen_range(0..JOIN_CODE_ALPHABET.len());
            JOIN_CODE_ALPHABET[index] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::convert::Infallible;

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Test Program"), "test-program");
        assert_eq!(slugify("  PyCon   2026! "), "pycon-2026");
        assert_eq!(slugify("Grants & Aid"), "grants-aid");
    }

    #[test]
    fn slugify_falls_back_for_empty_names() {
        assert_eq!(slugify("!!!"), "program");
    }

    #[test]
    fn unique_slug_probes_numeric_suffixes() {
        let existing: HashSet<&str> = ["test-program", "test-program-1"].into_iter().collect();
        let slug = unique_slug("Test Program", |candidate| {
            Ok::<_, Infallible>(existing.contains(candidate))
        })
        .expect("probe finishes");
        assert_eq!(slug, "test-program-2");
    }

    #[test]
    fn unique_slug_keeps_base_when_free() {
        let slug =
            unique_slug("Test Program", |_| Ok::<_, Infallible>(false)).expect("probe finishes");
        assert_eq!(slug, "test-program");
    }

    #[test]
    fn join_code_is_eight_uppercase_alphanumerics() {
        let code = generate_join_code();
        assert_eq!(code.len(), 8);
        assert!(code
            .bytes()
            .all(|byte| JOIN_CODE_ALPHABET.contains(&byte)));
    }

    #[test]
    fn join_codes_vary_between_draws() {
        let codes: HashSet<String> = (0..32).map(|_| generate_join_code()).collect();
        // 36^8 possibilities; 32 draws colliding into one bucket would mean
        // the generator is broken.
        assert!(codes.len() > 1);
    }
}
