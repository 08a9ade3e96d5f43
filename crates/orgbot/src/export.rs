//! CSV export for the admin record listing

use orgbot_storage::StoredRecord;

pub fn to_csv(
    records: &[StoredRecord],
) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    Ok(writer.into_inner()?)
}
