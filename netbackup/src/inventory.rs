//! `;`-delimited device inventory.
//!
//! ```text
//! name;host;device_type;credentials
//! sw1;10.0.0.1;mikrotik_routeros;MAIN_USER
//! fw1;10.0.0.2;fortinet;FORTI_TOKEN
//! ```
//!
//! The first row is a header and is discarded. Blank lines are ignored,
//! fields are trimmed and may be double-quoted (`""` inside quotes is a
//! literal quote).

use std::path::Path;

use crate::backup::DeviceRecord;
use crate::error::InventoryError;

const DELIMITER: char = ';';
const FIELDS: usize = 4;

/// Read and parse an inventory file.
pub fn load(path: &Path) -> Result<Vec<DeviceRecord>, InventoryError> {
    let text = std::fs::read_to_string(path).map_err(|source| InventoryError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

/// Parse inventory text.
pub fn parse(text: &str) -> Result<Vec<DeviceRecord>, InventoryError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());

    if rows.next().is_none() {
        return Err(InventoryError::Empty);
    }

    rows.map(|(line_no, line)| {
        let fields = split_fields(line);
        match <[String; FIELDS]>::try_from(fields) {
            Ok([name, host, device_kind, credential_ref]) => Ok(DeviceRecord {
                name,
                host,
                device_kind,
                credential_ref,
            }),
            Err(fields) => Err(InventoryError::FieldCount {
                line: line_no,
                found: fields.len(),
            }),
        }
    })
    .collect()
}

fn split_fields(line: &str) -> Vec<String> {
    let mut fields = vec![];
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' if quoted => quoted = false,
            '"' if field.trim().is_empty() => {
                field.clear();
                quoted = true;
            }
            c if c == DELIMITER && !quoted => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }
    fields.push(field.trim().to_string());

    fields
}
