use cfgsheet_loader::{
    DataValue, LoadError, LoadPhase, MemoryWorkbook, RowColumnDataSource, SheetReader,
};
use cfgsheet_schema::{BeanDef, Schema, SchemaDef};
use cfgsheet_testkit::{grid, table, write_workbook};

fn item_schema() -> Schema {
    SchemaDef::new()
        .with_bean(
            BeanDef::new("Item")
                .field("id", "int")
                .field("name", "string")
                .field("desc", "string"),
        )
        .build()
        .unwrap()
}

fn item_sheet(rows: Vec<Vec<cfgsheet_testkit::CellValue>>) -> Vec<Vec<cfgsheet_testkit::CellValue>> {
    let mut g = grid![
        ["##var", "id", "name", "desc"],
        ["##type", "int", "string", "string"],
    ];
    g.extend(rows);
    g
}

#[test]
fn sword_row_becomes_one_record() {
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Items",
        item_sheet(grid![["", 1, "Sword", "A sharp blade"]]),
    );
    let mut source = RowColumnDataSource::new();
    source.load("item.xlsx", None, &mut wb).unwrap();
    let records = source.read_multi(&item_schema(), "Item").unwrap();

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.data.type_name, "Item");
    assert_eq!(record.data.get("id"), Some(&DataValue::Int(1)));
    assert_eq!(record.data.get("name").and_then(DataValue::as_str), Some("Sword"));
    assert_eq!(
        record.data.get("desc").and_then(DataValue::as_str),
        Some("A sharp blade")
    );
    assert!(record.tags.is_empty());
    assert_eq!(record.source.to_string(), "Items@item.xlsx");
    assert_eq!(record.row, 3);
}

#[test]
fn records_follow_sheet_then_row_order_and_skip_ignored_rows() {
    let mut wb = MemoryWorkbook::new()
        .with_sheet(
            "A",
            item_sheet(grid![
                ["", 1, "a", ""],
                ["!", 2, "not a number is fine here", "skipped"],
                ["", 3, "c", ""],
            ]),
        )
        .with_sheet("readme", grid![["free text"]])
        .with_sheet(
            "B",
            item_sheet(grid![
                ["dev", 4, "d", ""],
                ["##", "abc", "", ""],
            ]),
        );
    let mut source = RowColumnDataSource::new();
    source.load("item.xlsx", None, &mut wb).unwrap();
    let records = source.read_multi(&item_schema(), "Item").unwrap();

    let ids: Vec<i64> = records
        .iter()
        .filter_map(|r| r.data.get("id").and_then(DataValue::as_i64))
        .collect();
    assert_eq!(ids, vec![1, 3, 4]);
    let sheets: Vec<String> = records.iter().map(|r| r.source.to_string()).collect();
    assert_eq!(sheets, vec!["A@item.xlsx", "A@item.xlsx", "B@item.xlsx"]);
    assert!(records[2].has_tag("dev"));
    assert_eq!(source.phase(), LoadPhase::Done);
}

#[test]
fn reading_twice_gives_equal_records() {
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Items",
        item_sheet(grid![["", 1, "a", "x"], ["", 2, "b", "y"]]),
    );
    let mut source = RowColumnDataSource::new();
    source.load("item.xlsx", None, &mut wb).unwrap();
    let first = source.read_multi(&item_schema(), "Item").unwrap();
    let second = source.read_multi(&item_schema(), "Item").unwrap();
    assert_eq!(first, second);
}

#[test]
fn missing_named_sheet_names_it_in_the_error() {
    let mut wb = MemoryWorkbook::new().with_sheet("Items", item_sheet(Vec::new()));
    let mut source = RowColumnDataSource::new();
    let err = source
        .load("item.xlsx", Some("Weapons"), &mut wb)
        .unwrap_err();
    match &err {
        LoadError::HeaderNotFound { url, sheet } => {
            assert_eq!(url, "item.xlsx");
            assert_eq!(sheet.as_deref(), Some("Weapons"));
        }
        other => panic!("expected HeaderNotFound, got {other:?}"),
    }
    assert!(err.to_string().contains("Weapons"));
    assert_eq!(source.phase(), LoadPhase::Failed);
}

#[test]
fn workbook_without_table_sheets_has_no_sheet_in_the_error() {
    let mut wb = MemoryWorkbook::new().with_sheet("notes", grid![["hello"]]);
    let mut source = RowColumnDataSource::new();
    let err = source.load("notes.xlsx", None, &mut wb).unwrap_err();
    assert!(matches!(err, LoadError::HeaderNotFound { sheet: None, .. }));
    assert!(err.to_string().contains("notes.xlsx"));
}

#[test]
fn bad_int_is_located_at_sheet_and_cell() {
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Weapons",
        item_sheet(grid![["", 1, "a", ""], ["", "abc", "b", ""]]),
    );
    let mut source = RowColumnDataSource::new();
    source.load("item.xlsx", None, &mut wb).unwrap();
    let err = source.read_multi(&item_schema(), "Item").unwrap_err();

    let data = err.as_data_error().expect("field construction error");
    assert_eq!(data.path_string(), "id");
    assert_eq!(data.location.map(|l| l.to_a1()), Some("B4".to_string()));
    let origin = data.origin.as_ref().expect("origin attached");
    assert_eq!(origin.sheet.as_deref(), Some("Weapons"));
    assert_eq!(origin.url, "item.xlsx");
    assert!(err.to_string().contains("Weapons@item.xlsx!B4"));
    assert_eq!(source.phase(), LoadPhase::Failed);
}

#[test]
fn later_sheets_share_the_first_header() {
    let mut wb = MemoryWorkbook::new()
        .with_sheet("A", item_sheet(grid![["", 1, "a", ""]]))
        .with_sheet("B", grid![["##"], ["", 2, "b", "from B"]]);
    let mut source = RowColumnDataSource::new();
    source.load("item.xlsx", None, &mut wb).unwrap();
    let records = source.read_multi(&item_schema(), "Item").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[1].data.get("desc").and_then(DataValue::as_str),
        Some("from B")
    );
}

#[test]
fn define_rows_without_id_column_use_row_index() {
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Items",
        grid![
            ["##var", "name", "value"],
            ["##type", "Flags", ""],
            ["", "first", 10],
            ["", "second", 20],
        ],
    );
    let mut source = RowColumnDataSource::new();
    source.load("flags.xlsx", None, &mut wb).unwrap();
    let rows = source.define_rows().unwrap();
    assert_eq!(
        rows,
        vec![
            vec!["Flags".to_string(), String::new(), String::new()],
            vec!["first".to_string(), "0".to_string(), "first".to_string()],
            vec!["second".to_string(), "1".to_string(), "second".to_string()],
        ]
    );
}

#[test]
fn header_info_without_materializing() {
    let mut wb = MemoryWorkbook::new().with_sheet(
        "Items",
        table(&["id", "name"], &["int", "string"], grid![[1, "a"]]),
    );
    let info = RowColumnDataSource::load_table_def_info("item.xlsx", None, &mut wb).unwrap();
    let names: Vec<(&str, &str)> = info
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.ty.as_str()))
        .collect();
    assert_eq!(names, vec![("id", "int"), ("name", "string")]);
}

#[cfg(feature = "json")]
#[test]
fn workbook_json_file_loads_end_to_end() {
    let file = write_workbook(&[(
        "Items",
        table(
            &["id", "name", "desc"],
            &["int", "string", "string"],
            grid![[7, "Bow", "Ranged"], [8, "Axe", ""]],
        ),
    )])
    .unwrap();
    let mut wb = MemoryWorkbook::open_path(file.path()).unwrap();
    assert_eq!(wb.sheet_names().unwrap(), vec!["Items".to_string()]);

    let mut source = RowColumnDataSource::new();
    source.load("items.json", None, &mut wb).unwrap();
    let records = source.read_multi(&item_schema(), "Item").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[1].data.get("desc"), Some(&DataValue::String(String::new())));
}
