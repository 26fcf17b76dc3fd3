use std::io::Read;

use csv::{ReaderBuilder, Trim};

use crate::error::Error;
use crate::models::{BomFields, BomRow};

/// Column every BOM must carry.
pub const PART_NUMBER_COLUMN: &str = "PartNumber";

/// Read a CSV bill of materials.
///
/// The header is validated once before any row is read; a missing
/// [`PART_NUMBER_COLUMN`] is an [`Error::Schema`]. All other columns are
/// carried through untouched, in file order.
pub fn read_bom<R: Read>(source: R) -> Result<Vec<BomRow>, Error> {
    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .from_reader(source);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

    let part_index = headers
        .iter()
        .position(|h| h == PART_NUMBER_COLUMN)
        .ok_or_else(|| Error::Schema {
            column: PART_NUMBER_COLUMN.to_string(),
        })?;

    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }

        let fields = headers
            .iter()
            .enumerate()
            .map(|(col, name)| (name.clone(), record.get(col).unwrap_or("").to_string()))
            .collect();

        rows.push(BomRow {
            row_number: i + 1,
            part_number: record.get(part_index).unwrap_or("").to_string(),
            fields: BomFields(fields),
        });
    }

    tracing::debug!(rows = rows.len(), columns = headers.len(), "read BOM");
    Ok(rows)
}
