// tests/integration/card_splitting.rs
//! Ordering, limit and minimality guarantees of the splitter over many card shapes.

use alert2teams::{split_card, CardLimits, RenderedDocument, SplitError};
use indexmap::IndexMap;
use serde_json::{json, Value};

/// Deterministic section sizes, spread between `min` and `max` bytes of text.
fn pseudo_random_sizes(seed: u64, count: usize, min: usize, max: usize) -> Vec<usize> {
    let mut state = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
    (0..count)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            min + (state >> 33) as usize % (max - min + 1)
        })
        .collect()
}

fn card(title_len: usize, text_sizes: &[usize]) -> RenderedDocument {
    let mut fields = IndexMap::new();
    fields.insert("@type".to_string(), json!("MessageCard"));
    fields.insert("themeColor".to_string(), json!("8C1A1A"));
    fields.insert("title".to_string(), json!("t".repeat(title_len)));
    let sections = text_sizes
        .iter()
        .enumerate()
        .map(|(i, size)| json!({"activityTitle": format!("alert {}", i), "text": "x".repeat(*size)}))
        .collect();
    RenderedDocument::new(fields, sections)
}

fn shapes() -> Vec<RenderedDocument> {
    let mut cards = vec![
        card(10, &[]),
        card(10, &[100]),
        card(2000, &[20000]),
        card(50, &[14000, 10, 10, 14000]),
    ];
    for seed in 0..40u64 {
        let count = (seed as usize * 7) % 60;
        cards.push(card(
            (seed as usize * 131) % 3000,
            &pseudo_random_sizes(seed, count, 0, 6000),
        ));
    }
    cards
}

fn json_len(value: &Value) -> usize {
    serde_json::to_vec(value).unwrap().len()
}

#[test]
fn concatenated_fragments_equal_original_sections() {
    for card in shapes() {
        let fragments = split_card(&card, CardLimits::TEAMS).unwrap();
        let rejoined: Vec<Value> = fragments
            .iter()
            .flat_map(|f| f.sections().to_vec())
            .collect();
        assert_eq!(rejoined.as_slice(), card.sections());
    }
}

#[test]
fn every_fragment_respects_limits_unless_irreducible() {
    let limits = CardLimits::TEAMS;
    for card in shapes() {
        for fragment in split_card(&card, limits).unwrap() {
            assert!(fragment.section_count() <= limits.max_sections);
            let size = fragment.serialized_len().unwrap();
            if size > limits.max_bytes {
                assert_eq!(
                    fragment.section_count(),
                    1,
                    "only a lone oversized section may exceed the byte limit"
                );
            }
            assert_eq!(fragment.fields(), card.fields());
        }
    }
}

#[test]
fn each_boundary_is_forced_by_a_limit() {
    let limits = CardLimits::TEAMS;
    for card in shapes() {
        let fragments = split_card(&card, limits).unwrap();
        for pair in fragments.windows(2) {
            let (current, next) = (&pair[0], &pair[1]);
            let mut extended = current.sections().to_vec();
            extended.push(next.sections()[0].clone());
            let grown = current.with_sections(extended);

            let breaks_count = grown.section_count() > limits.max_sections;
            let breaks_size = grown.serialized_len().unwrap() > limits.max_bytes;
            assert!(
                breaks_count || breaks_size,
                "fragment closed early: {} sections, next section {} bytes",
                current.section_count(),
                json_len(&next.sections()[0])
            );
        }
    }
}

#[test]
fn splitting_is_deterministic() {
    for card in shapes() {
        let first = split_card(&card, CardLimits::TEAMS).unwrap();
        let second = split_card(&card, CardLimits::TEAMS).unwrap();
        let bytes = |fragments: &[RenderedDocument]| -> Vec<Vec<u8>> {
            fragments.iter().map(|f| f.to_json_bytes().unwrap()).collect()
        };
        assert_eq!(bytes(&first), bytes(&second));
    }
}

#[test]
fn input_card_is_untouched() {
    let card = card(100, &pseudo_random_sizes(7, 30, 100, 3000));
    let before = card.clone();
    let _ = split_card(&card, CardLimits::TEAMS).unwrap();
    assert_eq!(card, before);
}

#[test]
fn oversized_fields_fail_before_any_fragment() {
    let card = card(15000, &[10, 10]);
    assert!(matches!(
        split_card(&card, CardLimits::TEAMS),
        Err(SplitError::BaseTooLarge { .. })
    ));
}
