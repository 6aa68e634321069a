//! Reads survey data from a three-sheet workbook or a flat CSV export.

use anyhow::{Context, Result};
use calamine::{Data, Reader, Xlsx, open_workbook};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::config::DatasetSchema;
use crate::dataset::{Dataset, Item, ItemCode, Rating};
use crate::error::AnalysisError;
use crate::table::{Cell, Table};

/// Loads a workbook with a translation sheet, an item sheet and an
/// evaluation sheet.
///
/// The translation sheet maps each item's letter code to its numeric code;
/// evaluations refer to items by numeric code.
///
/// # Errors
///
/// Fails if the file cannot be opened, a sheet or column named in `schema` is
/// missing, or a cell cannot be interpreted.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_workbook(path: impl AsRef<Path>, schema: &DatasetSchema) -> Result<Dataset> {
    let path = path.as_ref();
    let mut workbook: Xlsx<_> = open_workbook(path)
        .with_context(|| format!("Failed to open workbook '{}'", path.display()))?;

    let translation = read_sheet(&mut workbook, &schema.translation_sheet)?;
    let items = read_sheet(&mut workbook, &schema.item_sheet)?;
    let evaluations = read_sheet(&mut workbook, &schema.evaluation_sheet)?;

    let dataset = dataset_from_sheets(&translation, &items, &evaluations, schema)?;
    info!(
        items = dataset.items().count(),
        ratings = dataset.rating_count(),
        categories = dataset.categories().len(),
        "Workbook loaded"
    );
    Ok(dataset)
}

/// Loads a flat CSV of ratings. Every item gets the category
/// `schema.csv_category` and is named after its code.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
pub fn load_csv(path: impl AsRef<Path>, schema: &DatasetSchema) -> Result<Dataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open CSV '{}'", path.display()))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "csv".to_string());

    let dataset = read_csv(file, &name, schema)?;
    info!(
        items = dataset.items().count(),
        ratings = dataset.rating_count(),
        "CSV loaded"
    );
    Ok(dataset)
}

/// Reads CSV ratings from any reader; `name` labels the table in errors.
pub fn read_csv<R: Read>(reader: R, name: &str, schema: &DatasetSchema) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record.with_context(|| format!("Failed to read CSV '{name}'"))?;
        rows.push(record.iter().map(Cell::text).collect());
    }
    let table = Table::new(name, headers, rows);

    let ratings = ratings_from_table(
        &table,
        &schema.csv_tester_column,
        &schema.csv_item_column,
        Some(table.column(&schema.timestamp_column)?),
        schema,
    )?;

    let mut codes: Vec<ItemCode> = ratings.iter().map(|r| r.item.clone()).collect();
    codes.sort();
    codes.dedup();
    let items = codes
        .into_iter()
        .map(|code| Item {
            name: code.to_string(),
            code,
            letter_code: None,
            category: schema.csv_category.clone(),
        })
        .collect();

    Ok(Dataset::new(
        schema.property_columns.clone(),
        schema.score_column.clone(),
        items,
        ratings,
    )?)
}

fn read_sheet<R>(workbook: &mut Xlsx<R>, name: &str) -> Result<Table>
where
    R: std::io::Read + std::io::Seek,
{
    if !workbook.sheet_names().iter().any(|s| s == name) {
        return Err(AnalysisError::MissingSheet(name.to_string()).into());
    }
    let range = workbook
        .worksheet_range(name)
        .with_context(|| format!("Failed to read sheet '{name}'"))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let rows: Vec<Vec<Cell>> = rows
        .map(|row| row.iter().map(cell_from_data).collect())
        .collect();

    debug!(sheet = name, rows = rows.len(), "Sheet read");
    Ok(Table::new(name, headers, rows))
}

fn cell_from_data(data: &Data) -> Cell {
    match data {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::text(s),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => Cell::DateTime(naive),
            None => Cell::Number(dt.as_f64()),
        },
        Data::Error(e) => Cell::Text(format!("#{e:?}")),
        Data::Empty => Cell::Empty,
    }
}

/// Joins the translation table onto the item table and indexes the
/// evaluations by (tester, code).
pub fn dataset_from_sheets(
    translation: &Table,
    items: &Table,
    evaluations: &Table,
    schema: &DatasetSchema,
) -> Result<Dataset> {
    let letter_col = translation.column(&schema.letter_code_column)?;
    let code_col = translation.column(&schema.code_column)?;
    let mut letter_to_code: HashMap<String, ItemCode> = HashMap::new();
    for row in 0..translation.len() {
        let letter = translation.required_text(row, letter_col)?;
        let code = translation.item_code(row, code_col)?;
        letter_to_code.insert(letter, code);
    }

    let name_col = items.column(&schema.name_column)?;
    let item_letter_col = items.column(&schema.letter_code_column)?;
    let category_col = items.column(&schema.category_column)?;
    let mut item_list = Vec::with_capacity(items.len());
    for row in 0..items.len() {
        let letter = items.required_text(row, item_letter_col)?;
        let code = letter_to_code
            .get(&letter)
            .cloned()
            .ok_or_else(|| AnalysisError::UnknownLetterCode(letter.clone()))?;
        item_list.push(Item {
            code,
            name: items.required_text(row, name_col)?,
            letter_code: Some(letter),
            category: items.required_text(row, category_col)?,
        });
    }

    let ratings = ratings_from_table(
        evaluations,
        &schema.tester_column,
        &schema.code_column,
        evaluations.find_column(&schema.timestamp_column),
        schema,
    )?;

    Ok(Dataset::new(
        schema.property_columns.clone(),
        schema.score_column.clone(),
        item_list,
        ratings,
    )?)
}

fn ratings_from_table(
    table: &Table,
    tester_column: &str,
    item_column: &str,
    timestamp_col: Option<usize>,
    schema: &DatasetSchema,
) -> Result<Vec<Rating>, AnalysisError> {
    let tester_col = table.column(tester_column)?;
    let item_col = table.column(item_column)?;
    let property_cols = schema
        .property_columns
        .iter()
        .map(|name| table.column(name))
        .collect::<Result<Vec<_>, _>>()?;
    let score_col = table.column(&schema.score_column)?;

    let mut ratings = Vec::with_capacity(table.len());
    for row in 0..table.len() {
        let timestamp = match timestamp_col {
            Some(col) => table.timestamp(row, col)?,
            None => None,
        };
        let properties = property_cols
            .iter()
            .map(|&col| table.number(row, col))
            .collect::<Result<Vec<_>, _>>()?;

        ratings.push(Rating {
            tester: table.required_text(row, tester_col)?,
            item: table.item_code(row, item_col)?,
            timestamp,
            properties,
            score: table.number(row, score_col)?,
        });
    }
    Ok(ratings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
TBF,Nöt,Timestamp,Flottig,Knaprig,Rostad,Salt,Betyg
J1,AAA,2016/11/12 14:00:00,5,3,4,2,7
J2,AAA,2016/11/12 14:05:00,3,2,4,,5
J1,BBB,2016/11/12 14:10:00,6,4,5,3,8
J1,AAA,2016/11/12 13:00:00,1,1,1,1,1
";

    fn texts(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::text(v)).collect()
    }

    fn headers(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_read_csv_dedups_by_timestamp() {
        let dataset = read_csv(CSV.as_bytes(), "test.csv", &DatasetSchema::default()).unwrap();

        assert_eq!(dataset.rating_count(), 3);
        assert_eq!(dataset.categories(), ["Alla"]);

        let j1_aaa = dataset
            .ratings()
            .find(|r| r.tester == "J1" && r.item.as_str() == "AAA")
            .unwrap();
        assert_eq!(j1_aaa.score, Some(7.0));
        assert_eq!(j1_aaa.properties[0], Some(5.0));
    }

    #[test]
    fn test_read_csv_blank_cell_is_missing() {
        let dataset = read_csv(CSV.as_bytes(), "test.csv", &DatasetSchema::default()).unwrap();
        let j2_aaa = dataset.ratings().find(|r| r.tester == "J2").unwrap();
        assert_eq!(j2_aaa.properties[3], None);
    }

    #[test]
    fn test_read_csv_names_items_after_code() {
        let dataset = read_csv(CSV.as_bytes(), "test.csv", &DatasetSchema::default()).unwrap();
        let item = dataset.item(&ItemCode::new("BBB")).unwrap();
        assert_eq!(item.label(), "BBB (BBB)");
    }

    #[test]
    fn test_read_csv_missing_column() {
        let csv = "TBF,Nöt,Timestamp,Flottig,Knaprig,Rostad,Betyg\nJ1,AAA,,1,2,3,4\n";
        let err = read_csv(csv.as_bytes(), "short.csv", &DatasetSchema::default()).unwrap_err();

        assert_eq!(
            err.downcast_ref::<AnalysisError>(),
            Some(&AnalysisError::MissingColumn {
                table: "short.csv".into(),
                column: "Salt".into()
            })
        );
    }

    #[test]
    fn test_read_csv_bad_timestamp() {
        let csv = "TBF,Nöt,Timestamp,Flottig,Knaprig,Rostad,Salt,Betyg\nJ1,AAA,soon,1,2,3,4,5\n";
        let err = read_csv(csv.as_bytes(), "bad.csv", &DatasetSchema::default()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AnalysisError>(),
            Some(AnalysisError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_sheets_join_translation() {
        let schema = DatasetSchema::default();
        let translation = Table::new(
            "Sifferkoder",
            headers(&["Bokstavskod", "Sifferkod"]),
            vec![
                vec![Cell::text("A"), Cell::Number(101.0)],
                vec![Cell::text("B"), Cell::Number(201.0)],
            ],
        );
        let items = Table::new(
            "Nötter",
            headers(&["Namn", "Bokstavskod", "Nöttyp"]),
            vec![
                texts(&["Saltade", "A", "Jordnöt"]),
                texts(&["Naturell", "B", "Cashew"]),
            ],
        );
        let evaluations = Table::new(
            "Utvärdering",
            headers(&["Testare", "Sifferkod", "Flottig", "Knaprig", "Rostad", "Salt", "Betyg"]),
            vec![
                vec![
                    Cell::text("T1"),
                    Cell::Number(101.0),
                    Cell::Number(3.0),
                    Cell::Number(4.0),
                    Cell::Number(2.0),
                    Cell::Number(5.0),
                    Cell::Number(6.0),
                ],
                vec![
                    Cell::text("T1"),
                    Cell::Number(201.0),
                    Cell::Number(1.0),
                    Cell::Number(2.0),
                    Cell::Empty,
                    Cell::Number(1.0),
                    Cell::Number(8.0),
                ],
            ],
        );

        let dataset = dataset_from_sheets(&translation, &items, &evaluations, &schema).unwrap();

        assert_eq!(dataset.categories(), ["Jordnöt", "Cashew"]);
        let item = dataset.item(&ItemCode::new("101")).unwrap();
        assert_eq!(item.label(), "Saltade (101)");
        assert_eq!(item.letter_code.as_deref(), Some("A"));
        assert_eq!(dataset.rating_count(), 2);
    }

    #[test]
    fn test_sheets_unknown_letter_code() {
        let schema = DatasetSchema::default();
        let translation = Table::new(
            "Sifferkoder",
            headers(&["Bokstavskod", "Sifferkod"]),
            vec![vec![Cell::text("A"), Cell::Number(101.0)]],
        );
        let items = Table::new(
            "Nötter",
            headers(&["Namn", "Bokstavskod", "Nöttyp"]),
            vec![texts(&["Okänd", "Z", "Jordnöt"])],
        );
        let evaluations = Table::new(
            "Utvärdering",
            headers(&["Testare", "Sifferkod", "Flottig", "Knaprig", "Rostad", "Salt", "Betyg"]),
            vec![],
        );

        let err = dataset_from_sheets(&translation, &items, &evaluations, &schema).unwrap_err();
        assert_eq!(
            err.downcast_ref::<AnalysisError>(),
            Some(&AnalysisError::UnknownLetterCode("Z".into()))
        );
    }

    #[test]
    fn test_load_workbook_missing_file() {
        let path = std::env::temp_dir().join("nut_rater_missing_workbook.xlsx");
        let _ = std::fs::remove_file(&path);
        assert!(load_workbook(&path, &DatasetSchema::default()).is_err());
    }
}
