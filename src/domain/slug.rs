//! URL slugs derived from store names.

use regex::{Regex, RegexBuilder};
use std::collections::HashSet;

/// Slug used when a name has no URL-safe characters at all.
const FALLBACK_SLUG: &str = "store";

/// Lowercases `name`, folds common accented latin letters to ASCII, drops anything
/// else that isn't URL-safe and joins the remaining words with single hyphens.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        let folded = if ch.is_ascii_alphanumeric() {
            Some(Folded::Char(ch))
        } else {
            fold_latin(ch).map(Folded::Str)
        };
        match folded {
            Some(part) => {
                if pending_hyphen && !out.is_empty() {
                    out.push('-');
                }
                pending_hyphen = false;
                match part {
                    Folded::Char(c) => out.push(c),
                    Folded::Str(s) => out.push_str(s),
                }
            }
            None if ch.is_whitespace() || ch == '-' || ch == '_' => pending_hyphen = true,
            None => {}
        }
    }

    if out.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        out
    }
}

enum Folded {
    Char(char),
    Str(&'static str),
}

fn fold_latin(ch: char) -> Option<&'static str> {
    let s = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' => "o",
        'œ' => "oe",
        'ß' => "ss",
        'ś' | 'š' => "s",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ž' | 'ź' | 'ż' => "z",
        'ł' => "l",
        '&' => "and",
        _ => return None,
    };
    Some(s)
}

/// Pattern matching `base` itself or `base-<digits>`, case-insensitively.
///
/// The same source string is handed to Postgres (`~*`), so it must stay within the
/// regex subset both engines agree on.
pub fn collision_pattern(base: &str) -> String {
    format!("^({})(-[0-9]+)?$", regex::escape(base))
}

pub fn collision_regex(base: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&collision_pattern(base))
        .case_insensitive(true)
        .build()
}

/// Slug for a store whose base collides with `matches` existing slugs.
pub fn with_suffix(base: &str, matches: usize) -> String {
    if matches == 0 {
        base.to_string()
    } else {
        format!("{}-{}", base, matches + 1)
    }
}

/// Whether `slug` is `base` or one of its numbered variants.
pub fn is_variant_of(slug: &str, base: &str) -> bool {
    collision_regex(base).map_or(false, |re| re.is_match(slug))
}

/// Lowest unused candidate in the sequence `base`, `base-2`, `base-3`, ...
pub fn first_free<'a, I>(base: &str, taken: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let taken: HashSet<String> = taken.into_iter().map(str::to_lowercase).collect();
    (0..)
        .map(|n| with_suffix(base, n))
        .find(|candidate| !taken.contains(&candidate.to_lowercase()))
        .unwrap_or_else(|| base.to_string())
}
