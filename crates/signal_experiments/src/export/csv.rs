use crate::metrics::ComparisonRow;

pub(crate) fn write_rows(
    rows: &[ComparisonRow],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}
