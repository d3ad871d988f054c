//! Example: Read any spreadsheet and print its shape and column kinds

use sturdy_sheets::prelude::*;

fn main() -> Result<(), UnreadableFileError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/tmp/test.xlsx".to_string());

    let ds = read_table(&path, SheetSelector::First)?;
    println!("{path}: {ds}");

    for (i, name) in ds.column_names().iter().enumerate() {
        println!("  {name}: {:?}", ds.column_kind(i).unwrap());
    }

    if let Some(first) = ds.rows().first() {
        println!("first row: {first:?}");
    }

    Ok(())
}
