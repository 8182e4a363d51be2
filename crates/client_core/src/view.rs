//! Client-side derivation of the library view: filter, then stable sort.

use std::cmp::Ordering;

use shared::{domain::SortKey, protocol::LibraryItem};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// Pure function of its inputs. Filtering keeps items whose prompt contains
/// the trimmed, lowercased search text; an empty search keeps everything.
/// Sorting is stable, so ties keep their fetched order.
pub fn derive_view(items: &[LibraryItem], search_text: &str, sort_key: SortKey) -> Vec<LibraryItem> {
    let query = search_text.trim().to_lowercase();
    let mut view: Vec<LibraryItem> = items
        .iter()
        .filter(|item| query.is_empty() || item.prompt.to_lowercase().contains(&query))
        .cloned()
        .collect();

    match sort_key {
        SortKey::Newest => view.sort_by(|a, b| b.sort_millis().cmp(&a.sort_millis())),
        SortKey::Oldest => view.sort_by(|a, b| a.sort_millis().cmp(&b.sort_millis())),
        SortKey::Az => view.sort_by(|a, b| compare_prompts(&a.prompt, &b.prompt)),
        SortKey::Za => view.sort_by(|a, b| compare_prompts(&b.prompt, &a.prompt)),
    }
    view
}

/// Collation for prompt titles, closest to a root-locale compare: letters
/// first compare without accents or case, then unaccented before accented,
/// then lowercase before uppercase. The empty string sorts first.
pub fn compare_prompts(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| folded(a).cmp(folded(b)))
        .then_with(|| case_order(a, b))
}

fn base_letters(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn folded(text: &str) -> impl Iterator<Item = char> + '_ {
    text.nfd().flat_map(char::to_lowercase)
}

fn case_order(a: &str, b: &str) -> Ordering {
    a.nfd()
        .zip(b.nfd())
        .find_map(|(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
            (true, false) if y.is_uppercase() => Some(Ordering::Less),
            (false, true) if x.is_uppercase() => Some(Ordering::Greater),
            _ => None,
        })
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
#[path = "tests/view_tests.rs"]
mod tests;
