use crate::error::Result;
use crate::pool::InstrumentPool;
use crate::schema::{Instrument, InstrumentRecord, InstrumentStatus};
use log::info;

/// Validates ERP records into instruments. Records of every status are kept;
/// the pool decides what is selectable.
pub fn convert_records(records: Vec<InstrumentRecord>) -> Result<Vec<Instrument>> {
    records.into_iter().map(Instrument::try_from).collect()
}

pub fn parse_instrument_records(json: &str) -> Result<Vec<Instrument>> {
    let records: Vec<InstrumentRecord> = serde_json::from_str(json)?;
    convert_records(records)
}

pub fn pool_from_records(records: Vec<InstrumentRecord>) -> Result<InstrumentPool> {
    let instruments = convert_records(records)?;
    let in_portfolio = instruments
        .iter()
        .filter(|i| i.status() == InstrumentStatus::InPortfolio)
        .count();

    info!(
        "Ingested {} instruments, {} in portfolio",
        instruments.len(),
        in_portfolio
    );

    InstrumentPool::new(instruments)
}

pub fn pool_from_json(json: &str) -> Result<InstrumentPool> {
    let records: Vec<InstrumentRecord> = serde_json::from_str(json)?;
    pool_from_records(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaymentPlanError;
    use rust_decimal_macros::dec;

    const RECORDS: &str = r#"[
        {"id": "1", "amount": "1500.00", "due_date": "2024-03-20", "bank_name": "Halkbank",
         "serial_no": "HB-001", "client_name": "Yilmaz Insaat", "status": "portfolio"},
        {"id": "2", "amount": "800.25", "due_date": "2024-02-10", "bank_name": "Akbank",
         "serial_no": "AK-114", "client_name": "Kara Tekstil", "status": "endorsed"},
        {"id": "3", "amount": "2200", "due_date": "2024-02-28", "bank_name": "Garanti",
         "serial_no": "GA-903", "client_name": "Deniz Gida", "status": "in_portfolio"}
    ]"#;

    #[test]
    fn test_pool_from_json_filters_status() {
        let pool = pool_from_json(RECORDS).unwrap();
        assert_eq!(pool.len(), 2);

        let ids: Vec<&str> = pool.all().iter().map(|i| i.id().as_str()).collect();
        assert_eq!(ids, vec!["3", "1"]);
        assert_eq!(pool.total_amount(), dec!(3700.00));
    }

    #[test]
    fn test_parse_keeps_all_statuses() {
        let instruments = parse_instrument_records(RECORDS).unwrap();
        assert_eq!(instruments.len(), 3);
        assert_eq!(instruments[1].status(), InstrumentStatus::Endorsed);
    }

    #[test]
    fn test_invalid_amount_reported() {
        let json = r#"[{"id": "9", "amount": "-5", "due_date": "2024-03-20"}]"#;
        let result = pool_from_json(json);
        assert!(matches!(
            result,
            Err(PaymentPlanError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn test_malformed_json_reported() {
        let result = pool_from_json("[{\"id\": ");
        assert!(matches!(
            result,
            Err(PaymentPlanError::SerializationError(_))
        ));
    }
}
