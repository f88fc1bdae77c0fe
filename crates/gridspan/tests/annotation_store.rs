//! The generic range store used with a caller-defined payload, and the feature stores built on it

use gridspan::prelude::*;
use gridspan::{Annotation, InvalidationPolicy, NoSheets, OverlapMode, RangeStore};
use pretty_assertions::assert_eq;

#[derive(Debug, Clone, PartialEq)]
struct Highlight {
    color: Color,
    note: String,
}

impl Annotation for Highlight {
    // Notes are informational and do not prevent merging.
    fn same_payload(&self, other: &Self) -> bool {
        self.color == other.color
    }
}

fn highlight(color: Color, note: &str) -> Highlight {
    Highlight {
        color,
        note: note.to_string(),
    }
}

fn rs(text: &str) -> Vec<RangeAddress> {
    RangeAddress::parse_list(text).unwrap()
}

fn text(ranges: &[RangeAddress]) -> String {
    RangeAddress::format_list(ranges, FormatOptions::a1(), &NoSheets)
}

#[test]
fn test_consolidation_does_not_depend_on_insertion_order() {
    let orders = [
        ["B2:C2", "B4:C4", "B3:C3"],
        ["B3:C3", "B2:C2", "B4:C4"],
        ["B4:C4", "B3:C3", "B2:C2"],
    ];
    for order in orders {
        let mut store = RangeStore::new(OverlapMode::Overlap);
        for (i, range) in order.iter().enumerate() {
            store
                .add(rs(range), highlight(Color::YELLOW, &i.to_string()))
                .unwrap();
        }
        store.consolidate();
        assert_eq!(store.len(), 1, "order {:?}", order);
        assert_eq!(text(store.iter().next().unwrap().ranges()), "B2:C4");
    }
}

#[test]
fn test_custom_equality_controls_merging() {
    let mut store = RangeStore::new(OverlapMode::Overlap);
    let first = store
        .add(rs("A1:A2"), highlight(Color::YELLOW, "first"))
        .unwrap();
    store
        .add(rs("A3:A4"), highlight(Color::YELLOW, "second"))
        .unwrap();
    store.add(rs("A5"), highlight(Color::RED, "third")).unwrap();

    store.consolidate();
    assert_eq!(store.len(), 2);
    let merged = store.get(first).unwrap();
    assert_eq!(text(merged.ranges()), "A1:A4");
    assert_eq!(merged.payload().note, "first");
}

#[test]
fn test_split_mode_carves_existing_entries() {
    let mut store = RangeStore::new(OverlapMode::Split);
    let old = store
        .add(rs("B2:G7,C11:C13"), highlight(Color::YELLOW, "old"))
        .unwrap();
    let new = store
        .add(rs("E4:G6"), highlight(Color::YELLOW, "new"))
        .unwrap();

    assert_eq!(
        text(store.get(old).unwrap().ranges()),
        "B2:G3,B4:D6,B7:G7,C11:C13"
    );
    assert_eq!(text(store.get(new).unwrap().ranges()), "E4:G6");
    assert_eq!(
        store.find_covering(&Address::new(5, 5)).map(|h| h.note.as_str()),
        Some("new")
    );
    assert_eq!(
        store.find_covering(&Address::new(5, 2)).map(|h| h.note.as_str()),
        Some("old")
    );
}

#[test]
fn test_handles_survive_unrelated_removals() {
    let mut store = RangeStore::new(OverlapMode::Split);
    let a = store.add(rs("A1"), highlight(Color::RED, "a")).unwrap();
    let b = store.add(rs("B1:B3"), highlight(Color::RED, "b")).unwrap();
    let c = store.add(rs("C1"), highlight(Color::RED, "c")).unwrap();

    store.remove_range(a, &RangeAddress::parse("A1").unwrap()).unwrap();
    assert!(store.get(a).is_none());
    store.remove_range(b, &RangeAddress::parse("B2").unwrap()).unwrap();

    assert_eq!(text(store.get(b).unwrap().ranges()), "B1,B3");
    assert_eq!(store.get(c).unwrap().payload().note, "c");
    assert!(matches!(
        store.remove_range(a, &RangeAddress::parse("A1").unwrap()),
        Err(Error::EntryNotFound(_))
    ));
}

#[test]
fn test_intersecting_lookup_keeps_priority_order() {
    let mut store = RangeStore::new(OverlapMode::Overlap);
    store.add(rs("A1:D4"), highlight(Color::RED, "low")).unwrap();
    store.add(rs("C3:F6"), highlight(Color::YELLOW, "high")).unwrap();
    store.add(rs("H1"), highlight(Color::RED, "away")).unwrap();

    let hits: Vec<_> = store
        .find_intersecting(&RangeAddress::parse("B2:E5").unwrap())
        .into_iter()
        .map(|h| h.note.as_str())
        .collect();
    assert_eq!(hits, vec!["low", "high"]);
}

#[test]
fn test_keep_policy_retains_ref_ranges() {
    let mut store =
        RangeStore::new(OverlapMode::Overlap).with_policy(InvalidationPolicy::Keep);
    let id = store
        .add(rs("B2,D2"), highlight(Color::RED, "kept"))
        .unwrap();

    let report = store.shift_all(&Edit::DeleteColumns { at: 2, count: 1 });
    assert!(report.is_lossy());
    assert!(report.removed.is_empty());
    assert_eq!(text(store.get(id).unwrap().ranges()), "#REF!,C2");
}

#[test]
fn test_conditional_formats_overlap_in_priority_order() {
    let mut sheet = Worksheet::new("Formats");
    let red = sheet.intern_style(Style::new().fill_color(Color::LIGHT_RED));
    let green = sheet.intern_style(Style::new().fill_color(Color::LIGHT_GREEN));
    let formats = sheet.conditional_formats_mut();
    formats
        .add(
            rs("A1:A10"),
            ConditionalFormatRule::cell_is_greater_than("100")
                .with_format(red)
                .with_stop_if_true(true),
        )
        .unwrap();
    formats
        .add(
            rs("A5:A20"),
            ConditionalFormatRule::cell_is_less_than("0").with_format(green),
        )
        .unwrap();

    let rules = sheet.conditional_formats().rules_at(6, 1);
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].format, Some(red));
    assert_eq!(sheet.conditional_formats().effective_rules_at(6, 1).len(), 1);
    assert_eq!(sheet.conditional_formats().rules_at(15, 1)[0].format, Some(green));
}

#[test]
fn test_validation_lookup_after_split() {
    let mut sheet = Worksheet::new("Rules");
    let positive = DataValidation::decimal(ValidationOperator::GreaterThan, "0");
    let yes_no = DataValidation::list("Yes,No");
    sheet
        .validations_mut()
        .add(rs("B2:G7"), positive.clone())
        .unwrap();
    sheet.validations_mut().add(rs("E4:G6"), yes_no.clone()).unwrap();

    assert_eq!(sheet.data_validation_at(5, 6), Some(&yes_no));
    assert_eq!(sheet.data_validation_at(5, 2), Some(&positive));
    assert_eq!(sheet.data_validation_at(7, 7), Some(&positive));
    assert!(!sheet.has_data_validation(8, 2));
    assert_eq!(sheet.validations().len(), 2);
}
