use serde_json::json;

use super::*;

fn item(id: &str, prompt: &str, created_at: Option<&str>) -> LibraryItem {
    let mut value = json!({"id": id, "prompt": prompt});
    if let Some(created_at) = created_at {
        value["created_at"] = json!(created_at);
    }
    LibraryItem::from_value(&value)
}

fn prompts(view: &[LibraryItem]) -> Vec<&str> {
    view.iter().map(|item| item.prompt.as_str()).collect()
}

fn sample() -> Vec<LibraryItem> {
    vec![
        item("1", "Alpha", Some("2024-01-01T00:00:00Z")),
        item("2", "Beta", Some("2024-02-01T00:00:00Z")),
    ]
}

#[test]
fn oldest_and_za_order_the_sample_listing() {
    let items = sample();
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Oldest)), ["Alpha", "Beta"]);
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Za)), ["Beta", "Alpha"]);
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Newest)), ["Beta", "Alpha"]);
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Az)), ["Alpha", "Beta"]);
}

#[test]
fn newest_is_a_stable_permutation_with_missing_dates_last() {
    let items = vec![
        item("a", "undated first", None),
        item("b", "same time one", Some("2024-05-01T10:00:00Z")),
        item("c", "later", Some("2024-06-01T10:00:00Z")),
        item("d", "same time two", Some("2024-05-01T10:00:00Z")),
        item("e", "undated second", None),
    ];
    let view = derive_view(&items, "", SortKey::Newest);
    assert_eq!(view.len(), items.len());
    let ids: Vec<_> = view.iter().map(|item| item.id.as_deref().unwrap()).collect();
    assert_eq!(ids, ["c", "b", "d", "a", "e"]);

    let view = derive_view(&items, "", SortKey::Oldest);
    let ids: Vec<_> = view.iter().map(|item| item.id.as_deref().unwrap()).collect();
    assert_eq!(ids, ["a", "e", "b", "d", "c"]);
}

#[test]
fn filter_is_trimmed_and_case_insensitive() {
    let items = vec![
        item("1", "Product Launch Tweet", None),
        item("2", "Feature Update Email", None),
        item("3", "launch recap", None),
    ];
    let view = derive_view(&items, "  LAUNCH ", SortKey::Newest);
    assert_eq!(prompts(&view), ["Product Launch Tweet", "launch recap"]);

    assert_eq!(derive_view(&items, "   ", SortKey::Newest).len(), 3);
    assert!(derive_view(&items, "webinar", SortKey::Newest).is_empty());
}

#[test]
fn empty_prompts_only_match_an_empty_search() {
    let items = vec![item("1", "", None), item("2", "Untitled draft", None)];
    assert_eq!(derive_view(&items, "untitled", SortKey::Az).len(), 1);
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Az)), ["", "Untitled draft"]);
    assert_eq!(prompts(&derive_view(&items, "", SortKey::Za)), ["Untitled draft", ""]);
}

#[test]
fn title_order_ignores_case_first() {
    let items = vec![
        item("1", "banana", None),
        item("2", "Apple", None),
        item("3", "apple", None),
        item("4", "Cherry", None),
    ];
    assert_eq!(
        prompts(&derive_view(&items, "", SortKey::Az)),
        ["apple", "Apple", "banana", "Cherry"]
    );
    assert_eq!(
        prompts(&derive_view(&items, "", SortKey::Za)),
        ["Cherry", "banana", "Apple", "apple"]
    );
}

#[test]
fn accented_titles_sort_with_their_base_letter() {
    let items = vec![
        item("1", "zebra", None),
        item("2", "\u{c9}clair", None),
        item("3", "apple", None),
        item("4", "eclair", None),
        item("5", "E\u{301}clair", None),
    ];
    assert_eq!(
        prompts(&derive_view(&items, "", SortKey::Az)),
        ["apple", "eclair", "\u{c9}clair", "E\u{301}clair", "zebra"]
    );
    assert_eq!(
        prompts(&derive_view(&items, "", SortKey::Za)),
        ["zebra", "\u{c9}clair", "E\u{301}clair", "eclair", "apple"]
    );
}

#[test]
fn shorter_iso_dates_order_by_their_real_time() {
    let items = vec![
        item("a", "undated", None),
        item("b", "minutes", Some("2024-03-01T12:30Z")),
        item("c", "date only", Some("2024-03-01")),
        item("d", "next day", Some("2024-03-02")),
    ];
    let view = derive_view(&items, "", SortKey::Newest);
    let ids: Vec<_> = view.iter().map(|item| item.id.as_deref().unwrap()).collect();
    assert_eq!(ids, ["d", "b", "c", "a"]);
}

#[test]
fn equal_titles_keep_fetched_order_in_both_directions() {
    let items = vec![item("x", "Same", None), item("y", "Same", None)];
    for key in [SortKey::Az, SortKey::Za] {
        let view = derive_view(&items, "", key);
        let ids: Vec<_> = view.iter().map(|item| item.id.as_deref().unwrap()).collect();
        assert_eq!(ids, ["x", "y"]);
    }
}

#[test]
fn derivation_is_pure() {
    let items = sample();
    let once = derive_view(&items, "a", SortKey::Za);
    let twice = derive_view(&items, "a", SortKey::Za);
    assert_eq!(once, twice);
    assert_eq!(items, sample());
}
