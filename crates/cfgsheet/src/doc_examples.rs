use crate::{MemoryWorkbook, Record, RowColumnDataSource, Schema};

/// Read every record of `bean` from a workbook JSON document.
///
/// This helper is intended for documentation examples to avoid repetitive setup.
///
/// # Example
///
/// ```rust
/// # use cfgsheet::doc_examples::read_json_table;
/// let schema = cfgsheet::Schema::from_yaml_str(
///     "beans: [{ name: Item, fields: [{ name: id, type: int }, { name: name, type: string }] }]",
/// )?;
/// let workbook = r###"{"sheets": [{"name": "Items", "rows": [
///     ["##var", "id", "name"],
///     ["",      1,    "Sword"],
///     ["!",     2,    "Draft"]
/// ]}]}"###;
/// let records = read_json_table(workbook, &schema, "Item")?;
/// assert_eq!(records.len(), 1);
/// assert_eq!(records[0].data.to_string(), "Item { id: 1, name: Sword }");
/// # Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
/// ```
pub fn read_json_table(
    workbook_json: &str,
    schema: &Schema,
    bean: &str,
) -> Result<Vec<Record>, Box<dyn std::error::Error + Send + Sync>> {
    let mut workbook = MemoryWorkbook::open_bytes(workbook_json.as_bytes())?;
    let mut source = RowColumnDataSource::new();
    source.load("workbook.json", None, &mut workbook)?;
    Ok(source.read_multi(schema, bean)?)
}
