//! Reference text round trips and shift properties

use gridspan::prelude::*;
use gridspan::{NoSheets, SheetRegistry, MAX_COLS, MAX_ROWS};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn address() -> impl Strategy<Value = Address> {
    (1..=MAX_ROWS, 1..=MAX_COLS, any::<bool>(), any::<bool>())
        .prop_map(|(row, col, rf, cf)| Address::with_fixed(row, col, rf, cf))
}

fn range() -> impl Strategy<Value = RangeAddress> {
    (address(), address()).prop_map(|(a, b)| RangeAddress::new(a, b))
}

/// Ranges in a small corner of the grid, where edits interact with them
fn near_range() -> impl Strategy<Value = RangeAddress> {
    (1..200i32, 1..200i32, 0..50i32, 0..50i32)
        .prop_map(|(r, c, h, w)| RangeAddress::from_coords(r, c, r + h, c + w))
}

fn insert() -> impl Strategy<Value = Edit> {
    (1..250i32, 1..40i32, any::<bool>()).prop_map(|(at, count, rows)| {
        if rows {
            Edit::InsertRows { at, count }
        } else {
            Edit::InsertColumns { at, count }
        }
    })
}

proptest! {
    #[test]
    fn a1_address_round_trip(addr in address()) {
        let text = addr.to_a1_string();
        let parsed = Address::parse(&text).unwrap();
        prop_assert_eq!(&parsed, &addr);
        prop_assert_eq!(parsed.row_fixed, addr.row_fixed);
        prop_assert_eq!(parsed.column_fixed, addr.column_fixed);
    }

    #[test]
    fn r1c1_address_round_trip(addr in address(), base in address()) {
        let absolute = Address::parse_r1c1(&addr.to_r1c1_string()).unwrap();
        prop_assert_eq!(&absolute, &addr);

        let relative = Address::parse_r1c1_relative(&addr.to_r1c1_relative(&base), &base).unwrap();
        prop_assert_eq!(&relative, &addr);
        prop_assert_eq!(relative.row_fixed, addr.row_fixed);
        prop_assert_eq!(relative.column_fixed, addr.column_fixed);
    }

    #[test]
    fn range_round_trip(range in range(), fixed in any::<bool>()) {
        let a1 = range.format(FormatOptions::a1().fixed(fixed), &NoSheets);
        prop_assert_eq!(&RangeAddress::parse(&a1).unwrap(), &range);

        let r1c1 = range.format(FormatOptions::r1c1(), &NoSheets);
        prop_assert_eq!(&RangeAddress::parse_r1c1(&r1c1).unwrap(), &range);
    }

    #[test]
    fn insert_zero_is_unchanged(range in range(), at in 1..=MAX_ROWS) {
        prop_assert_eq!(shift(&range, &Edit::InsertRows { at, count: 0 }), RangeOutcome::Unchanged);
        prop_assert_eq!(shift(&range, &Edit::DeleteRows { at, count: 0 }), RangeOutcome::Unchanged);
    }

    #[test]
    fn delete_undoes_insert(range in near_range(), edit in insert()) {
        let inserted = shift(&range, &edit);
        prop_assume!(matches!(inserted, RangeOutcome::Unchanged | RangeOutcome::Moved(_)));
        let moved = inserted.resolve(&range).unwrap();
        let restored = shift(&moved, &edit.inverse()).resolve(&moved);
        prop_assert_eq!(restored, Some(range));
    }

    #[test]
    fn shifted_ranges_stay_on_the_grid(range in range(), edit in insert()) {
        if let Some(shifted) = shift(&range, &edit).resolve(&range) {
            prop_assert!(shifted.is_valid());
            prop_assert!(shifted.last.row <= MAX_ROWS);
            prop_assert!(shifted.last.column <= MAX_COLS);
        }
    }
}

#[test]
fn test_persisted_reference_forms() {
    let mut sheets = SheetRegistry::new();
    let id = sheets.register("Sheet1").unwrap();
    let ranges: Vec<_> = RangeAddress::parse_list("$B$2,$B$3:$C$3")
        .unwrap()
        .into_iter()
        .map(|r| r.on_sheet(SheetRef::Live(id)))
        .collect();
    let options = FormatOptions::a1().with_sheet(true);
    assert_eq!(
        RangeAddress::format_list(&ranges, options, &sheets),
        "Sheet1!$B$2,Sheet1!$B$3:$C$3"
    );

    for text in ["#REF!", "#REF!A1:B2", "Sheet1!#REF!"] {
        let parsed = RangeAddress::parse(text).unwrap();
        assert!(!parsed.is_valid() || parsed.is_sheet_deleted(), "{}", text);
    }
    assert_eq!(
        RangeAddress::parse("#REF!A1:B2").unwrap().to_a1_string(),
        "#REF!A1:B2"
    );
}

#[test]
fn test_deleted_sheet_reference_lifecycle() {
    let mut wb = Workbook::new();
    wb.add_worksheet_with_name("Gone").unwrap();
    let id = wb.sheet_id(1).unwrap();
    let range = RangeAddress::parse("A1:B2")
        .unwrap()
        .on_sheet(SheetRef::Live(id));
    assert_eq!(wb.format_range(&range, true), "Gone!A1:B2");

    wb.remove_worksheet(1).unwrap();
    assert_eq!(wb.format_range(&range, true), "#REF!A1:B2");

    wb.purge_deleted_sheets();
    assert_eq!(wb.format_range(&range, true), "#REF!");
}

#[test]
fn test_parse_errors_are_surfaced() {
    for text in ["", "A0", "XFE1", "A1048577", "1A", "A1:", "R0C1"] {
        let result = if text.starts_with('R') {
            RangeAddress::parse_r1c1(text)
        } else {
            RangeAddress::parse(text)
        };
        assert!(result.is_err(), "{:?} should not parse", text);
    }
    assert!(matches!(
        RangeAddress::parse("A1:B"),
        Err(Error::Parse { .. })
    ));
}
