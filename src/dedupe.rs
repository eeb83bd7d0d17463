use crate::results::DealRecord;
use std::collections::HashSet;

/// Drop records whose price was already seen, keeping the first occurrence
///
/// Price alone is the identity key, so distinct products that share a price
/// collapse into one record. Intended to be applied per source.
pub fn dedupe(records: Vec<DealRecord>) -> Vec<DealRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::with_capacity(records.len());

    for record in records {
        if seen.insert(record.price.clone()) {
            unique.push(record);
        } else {
            ::log::debug!(
                "Dropping duplicate price {} from {}: {}",
                record.price,
                record.source,
                record.title
            );
        }
    }

    unique
}
