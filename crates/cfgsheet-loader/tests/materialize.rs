use cfgsheet_loader::{
    DataCreateErrorKind, DataValue, LoadError, LoaderConfig, MemoryWorkbook, RowColumnDataSource,
};
use cfgsheet_schema::Schema;
use cfgsheet_testkit::{CellValue, grid};

const SCHEMA: &str = r#"
beans:
  - name: Reward
    sep: ":"
    fields:
      - { name: id, type: int }
      - { name: count, type: int }
  - name: Item
    fields:
      - { name: id, type: int }
      - { name: name, type: string }
      - { name: price, type: "float?" }
      - { name: tags, type: "(set#sep=|),string" }
      - { name: rewards, type: "list,Reward", sep: ";" }
      - { name: attrs, type: "map,string,int" }
  - name: Drop
    fields:
      - { name: item, type: int }
      - { name: weight, type: int }
  - name: Chest
    fields:
      - { name: id, type: int }
      - { name: main, type: Reward }
      - { name: drops, type: "list,Drop" }
"#;

fn schema() -> Schema {
    Schema::from_yaml_str(SCHEMA).unwrap()
}

fn read(grid: Vec<Vec<CellValue>>, bean: &str, config: LoaderConfig) -> Result<Vec<cfgsheet_loader::Record>, LoadError> {
    let mut wb = MemoryWorkbook::new().with_sheet("S", grid);
    let mut source = RowColumnDataSource::with_config(config);
    source.load("t.xlsx", None, &mut wb)?;
    source.read_multi(&schema(), bean)
}

fn items() -> Vec<Vec<CellValue>> {
    grid![
        ["##var", "id", "name", "price", "tags", "rewards", "attrs"],
        ["##type", "int", "string", "float?", "(set#sep=|),string", "list,Reward", "map,string,int"],
        ["", 1, "Sword", 9.5, "melee|iron", "10:1;11:2", "atk,5,def,1"],
        ["", 2, "Stick", "", "", "", ""],
    ]
}

#[test]
fn collections_and_nested_beans_from_cells() {
    let records = read(items(), "Item", LoaderConfig::default()).unwrap();
    assert_eq!(records.len(), 2);

    let sword = &records[0].data;
    assert_eq!(sword.get("price"), Some(&DataValue::Float(9.5)));
    assert_eq!(
        sword.get("tags"),
        Some(&DataValue::Set(vec![
            DataValue::String("melee".into()),
            DataValue::String("iron".into()),
        ]))
    );
    let rewards = sword.get("rewards").and_then(DataValue::elements).unwrap();
    assert_eq!(rewards.len(), 2);
    assert_eq!(rewards[1].to_string(), "Reward { id: 11, count: 2 }");
    assert_eq!(
        sword.get("attrs"),
        Some(&DataValue::Map(vec![
            (DataValue::String("atk".into()), DataValue::Int(5)),
            (DataValue::String("def".into()), DataValue::Int(1)),
        ]))
    );

    let stick = &records[1].data;
    assert_eq!(stick.get("price"), Some(&DataValue::Null));
    assert_eq!(stick.get("tags"), Some(&DataValue::Set(Vec::new())));
    assert_eq!(stick.get("rewards"), Some(&DataValue::List(Vec::new())));
    assert_eq!(stick.get("attrs"), Some(&DataValue::Map(Vec::new())));
}

#[test]
fn nested_error_path_and_location() {
    let mut g = items();
    g.push(grid![["", 3, "Club", "", "", "12:1;13:many", ""]].remove(0));
    let err = read(g, "Item", LoaderConfig::default()).unwrap_err();
    let data = err.as_data_error().unwrap();
    assert_eq!(data.path_string(), "rewards[1].count");
    assert_eq!(data.location.map(|l| l.to_a1()), Some("F5".to_string()));
    assert!(matches!(data.kind, DataCreateErrorKind::InvalidValue { .. }));
}

#[test]
fn strict_empty_cells_when_defaults_are_off() {
    let config = LoaderConfig::default().with_empty_as_default(false);
    let g = grid![
        ["##var", "id", "name", "price", "tags", "rewards", "attrs"],
        ["", 1, "", "", "", "", ""],
    ];
    let err = read(g, "Item", config).unwrap_err();
    let data = err.as_data_error().unwrap();
    assert_eq!(data.kind, DataCreateErrorKind::EmptyValue);
    assert_eq!(data.path_string(), "name");
}

#[test]
fn multi_row_chest_with_sub_titled_bean() {
    let g = grid![
        ["##var", "id", "main", "", "*drops", ""],
        ["##var", "", "id", "count", "item", "weight"],
        ["##type", "int", "Reward", "", "list,Drop", ""],
        ["", 1, 100, 2, 500, 10],
        ["", "", "", "", 501, 20],
        ["", "", "", "", 502, 30],
        ["", 2, 200, 1, 600, 5],
    ];
    let records = read(g, "Chest", LoaderConfig::default()).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].row, 4);
    assert_eq!(records[1].row, 7);

    let first = &records[0].data;
    assert_eq!(first.get("main").map(ToString::to_string).as_deref(), Some("Reward { id: 100, count: 2 }"));
    let drops = first.get("drops").and_then(DataValue::elements).unwrap();
    let weights: Vec<i64> = drops
        .iter()
        .filter_map(|d| d.as_bean().and_then(|b| b.get("weight")).and_then(DataValue::as_i64))
        .collect();
    assert_eq!(weights, vec![10, 20, 30]);
    assert_eq!(
        records[1].data.get("drops").and_then(DataValue::elements).map(<[_]>::len),
        Some(1)
    );
}

#[test]
fn missing_required_column_is_reported() {
    let g = grid![["##var", "id", "name"], ["", 1, "Sword"]];
    let err = read(g, "Item", LoaderConfig::default()).unwrap_err();
    let data = err.as_data_error().unwrap();
    assert_eq!(
        data.kind,
        DataCreateErrorKind::MissingColumn {
            bean: "Item".into(),
            field: "tags".into()
        }
    );
    assert_eq!(data.location.map(|l| l.to_a1()), Some("B2".to_string()));
}

#[test]
fn trims_strings_when_configured() {
    let g = grid![
        ["##var", "id", "name"],
        ["", 1, "  padded  "],
    ];
    let schema = cfgsheet_schema::SchemaDef::new()
        .with_bean(cfgsheet_schema::BeanDef::new("Named").field("id", "int").field("name", "string"))
        .build()
        .unwrap();
    let mut wb = MemoryWorkbook::new().with_sheet("S", g);
    let mut source = RowColumnDataSource::with_config(LoaderConfig::default().with_trim_strings(true));
    source.load("t.xlsx", None, &mut wb).unwrap();
    let records = source.read_multi(&schema, "Named").unwrap();
    assert_eq!(records[0].data.get("name").and_then(DataValue::as_str), Some("padded"));
}

#[test]
fn ignored_continuation_row_adds_no_element() {
    let g = grid![
        ["##var", "id", "*drops"],
        ["", 1, 10],
        ["!", "", 11],
        ["", "", 12],
        ["", 2, 20],
    ];
    let schema = cfgsheet_schema::SchemaDef::new()
        .with_bean(cfgsheet_schema::BeanDef::new("Loot").field("id", "int").field("drops", "list,int"))
        .build()
        .unwrap();
    let mut wb = MemoryWorkbook::new().with_sheet("S", g);
    let mut source = RowColumnDataSource::new();
    source.load("t.xlsx", None, &mut wb).unwrap();
    let records = source.read_multi(&schema, "Loot").unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(
        records[0].data.get("drops"),
        Some(&DataValue::List(vec![DataValue::Int(10), DataValue::Int(12)]))
    );
    assert_eq!(
        records[1].data.get("drops"),
        Some(&DataValue::List(vec![DataValue::Int(20)]))
    );
}
