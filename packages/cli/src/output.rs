//! CSV output of reconciled records.

use std::io::Write;

use housing_affordability_models::AffordabilityRecord;

/// Writes `records` as CSV with a header row. Absent values are written as
/// empty fields.
///
/// # Errors
///
/// Returns [`csv::Error`] if serialization or the underlying write fails.
pub fn write_records<W: Write>(writer: W, records: &[AffordabilityRecord]) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    if records.is_empty() {
        writer.write_record(AffordabilityRecord::COLUMNS)?;
    }
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
