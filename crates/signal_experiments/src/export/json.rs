use serde::Serialize;

pub(crate) fn write_json<T: Serialize + ?Sized>(
    value: &T,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(file, value)?;
    Ok(())
}
