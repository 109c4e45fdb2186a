//! Transliterating slugify for note titles.
//!
//! Cyrillic titles are transliterated to Latin before slugifying, so
//! `"Новый заголовок"` becomes `"novyij-zagolovok"`. Characters with no
//! transliteration are dropped.

/// Maximum stored slug length, in characters.
pub const SLUG_MAX_LENGTH: usize = 100;

/// Convert a title to a URL-safe slug.
///
/// - Lowercases the input and spells `&` as `and`
/// - Collapses runs of whitespace and hyphens into a single hyphen
/// - Transliterates Russian and Ukrainian letters
/// - Keeps only ASCII letters, digits, `_` and `-`
///
/// The result may be empty when nothing in the title can be transliterated.
pub fn slugify(title: &str) -> String {
    let lowered = title
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");

    let mut collapsed = String::with_capacity(lowered.len());
    let mut in_separator = false;
    for c in lowered.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                collapsed.push('-');
                in_separator = true;
            }
        } else {
            collapsed.push(c);
            in_separator = false;
        }
    }

    let mut slug = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_' {
            slug.push(c);
        } else if let Some(latin) = transliterate(c) {
            slug.push_str(latin);
        }
    }

    slug.retain(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    slug
}

/// Truncate a slug to [`SLUG_MAX_LENGTH`] characters.
pub fn truncate(slug: &str) -> String {
    slug.chars().take(SLUG_MAX_LENGTH).collect()
}

/// Whether `value` is a well-formed slug: non-empty, ASCII letters, digits,
/// hyphens and underscores only.
pub fn is_valid(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn transliterate(c: char) -> Option<&'static str> {
    let latin = match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ы' => "yi",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        // Ukrainian
        'є' => "ye",
        'ї' => "yi",
        'і' => "i",
        'ґ' => "g",
        // Dashes survive as separators.
        '–' | '—' | '‒' => "-",
        // Hard and soft signs have no Latin letter.
        'ъ' | 'ь' => "",
        _ => return None,
    };
    Some(latin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_cyrillic_title() {
        assert_eq!(slugify("Новый заголовок"), "novyij-zagolovok");
        assert_eq!(slugify("Щука и ёж"), "schuka-i-yozh");
    }

    #[test]
    fn test_slugify_latin_title() {
        assert_eq!(slugify("Test Note Title"), "test-note-title");
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn test_slugify_collapses_separators() {
        assert_eq!(slugify("a  -- b"), "a-b");
        assert_eq!(slugify("Rust\tязык"), "rust-yazyik");
        assert_eq!(slugify("a—b"), "a-b");
    }

    #[test]
    fn test_slugify_keeps_hyphens_and_underscores() {
        assert_eq!(slugify("pre-existing-slug"), "pre-existing-slug");
        assert_eq!(slugify("snake_case title"), "snake_case-title");
        assert_eq!(slugify("Заметка номер 2"), "zametka-nomer-2");
    }

    #[test]
    fn test_slugify_ampersand() {
        assert_eq!(slugify("Tom & Jerry"), "tom-and-jerry");
    }

    #[test]
    fn test_slugify_signs_dropped() {
        assert_eq!(slugify("объём"), "obyom");
        assert_eq!(slugify("Съешь"), "sesh");
    }

    #[test]
    fn test_slugify_untransliterable_is_empty() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("日本"), "");
    }

    #[test]
    fn test_truncate() {
        let long = "a".repeat(150);
        assert_eq!(truncate(&long).len(), SLUG_MAX_LENGTH);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("note-slug_2"));
        assert!(!is_valid(""));
        assert!(!is_valid("with space"));
        assert!(!is_valid("заметка"));
    }
}
