//! Check-in workflows
//!
//! Each workflow takes the pool and, where it records who acted, the
//! caller's `AuthContext`. Handlers only translate HTTP to these calls.

pub mod barcode_binding;
pub mod entry_marking;
pub mod login;
pub mod participant_import;
pub mod participants;
pub mod staff_seed;

use sevs_common::{Error, Result};

/// Trimmed, non-empty value of every listed field, or a validation error
/// carrying `message`
pub(crate) fn required<'a, const N: usize>(
    fields: [Option<&'a str>; N],
    message: &str,
) -> Result<[&'a str; N]> {
    let mut values = [""; N];
    for (slot, field) in values.iter_mut().zip(fields) {
        match field.map(str::trim).filter(|v| !v.is_empty()) {
            Some(value) => *slot = value,
            None => return Err(Error::Validation(message.to_string())),
        }
    }
    Ok(values)
}
