use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::models::Patient;

pub(super) fn decode(bytes: &[u8]) -> Result<Vec<Patient>, String> {
    serde_json::from_slice(bytes).map_err(|e| e.to_string())
}

pub(super) fn encode(patients: &[Patient]) -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
    patients
        .serialize(&mut serializer)
        .map_err(|e| e.to_string())?;
    buffer.push(b'\n');
    Ok(buffer)
}
