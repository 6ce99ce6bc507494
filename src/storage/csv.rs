use csv_async::{AsyncReader, AsyncWriter, StringRecord};
use futures::stream::StreamExt;

use crate::models::{FIELD_NAMES, Patient};

/// Header positions of the eight fields, in `FIELD_NAMES` order.
type Columns = [usize; 8];

pub(super) async fn decode(bytes: &[u8]) -> Result<Vec<Patient>, String> {
    let mut reader = AsyncReader::from_reader(bytes);

    let headers = reader.headers().await.map_err(|e| e.to_string())?.clone();
    let mut columns: Columns = [0; 8];
    for (slot, name) in columns.iter_mut().zip(FIELD_NAMES) {
        *slot = headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| format!("missing column '{}'", name))?;
    }

    let records: Vec<Result<StringRecord, csv_async::Error>> = reader.records().collect().await;

    records
        .into_iter()
        .map(|record| {
            let record = record.map_err(|e| e.to_string())?;
            from_record(&record, &columns)
        })
        .collect()
}

fn from_record(record: &StringRecord, columns: &Columns) -> Result<Patient, String> {
    let text = |i: usize| record.get(columns[i]).unwrap_or("");
    let number = |i: usize| {
        text(i).trim().parse::<u32>().map_err(|e| {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            format!("line {}: bad {} '{}': {}", line, FIELD_NAMES[i], text(i), e)
        })
    };

    Ok(Patient {
        id: number(0)?,
        first_name: text(1).to_string(),
        last_name: text(2).to_string(),
        date_of_birth: text(3).to_string(),
        age: number(4)?,
        hometown: text(5).to_string(),
        house_number: text(6).to_string(),
        phone_number: text(7).to_string(),
    })
}

pub(super) async fn encode(patients: &[Patient]) -> Result<Vec<u8>, String> {
    let mut writer = AsyncWriter::from_writer(Vec::new());

    writer
        .write_record(&FIELD_NAMES)
        .await
        .map_err(|e| e.to_string())?;

    for patient in patients {
        let id = patient.id.to_string();
        let age = patient.age.to_string();
        writer
            .write_record(&[
                id.as_str(),
                patient.first_name.as_str(),
                patient.last_name.as_str(),
                patient.date_of_birth.as_str(),
                age.as_str(),
                patient.hometown.as_str(),
                patient.house_number.as_str(),
                patient.phone_number.as_str(),
            ])
            .await
            .map_err(|e| e.to_string())?;
    }

    writer
        .into_inner()
        .await
        .map_err(|_| "could not flush the CSV buffer".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn decodes_columns_by_header_name() {
        let text = "phone_number,id,first_name,last_name,date_of_birth,age,hometown,house_number\n\
                    024-000-0000,3,Ama,Mensah,15-06-1990,33,Accra,12\n";

        let patients = decode(text.as_bytes()).await.unwrap();

        assert_eq!(patients.len(), 1);
        assert_eq!(patients[0].id, 3);
        assert_eq!(patients[0].age, 33);
        assert_eq!(patients[0].phone_number, "024-000-0000");
    }

    #[tokio::test]
    async fn rejects_short_rows() {
        let text = "id,first_name,last_name,date_of_birth,age,hometown,house_number,phone_number\n\
                    1,Ama\n";

        assert!(decode(text.as_bytes()).await.is_err());
    }

    #[tokio::test]
    async fn header_only_is_empty() {
        let text = "id,first_name,last_name,date_of_birth,age,hometown,house_number,phone_number\n";

        assert!(decode(text.as_bytes()).await.unwrap().is_empty());
    }
}
