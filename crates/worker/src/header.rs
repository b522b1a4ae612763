//! SOH/ETX header framing applied when a host has `FILE_NAME_IS_HEADER` set
//! (specification §4.5, "Header injection").

const SOH: u8 = 0x01;
const ETX: u8 = 0x03;
const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// The header name derived from a file name: the part up to the first `.`
/// or `;`.
#[must_use]
pub fn header_name(file_name: &str) -> &str {
    let cut = file_name
        .char_indices()
        .find(|(_, c)| *c == '.' || *c == ';')
        .map_or(file_name.len(), |(idx, _)| idx);
    &file_name[..cut]
}

/// Builds the `SOH CR CR LF <header> CR CR LF` prefix prepended to a
/// payload, or `None` if the header is empty (nothing to derive).
#[must_use]
pub fn prefix(file_name: &str) -> Vec<u8> {
    let mut out = vec![SOH, CR, CR, LF];
    out.extend_from_slice(header_name(file_name).as_bytes());
    out.extend_from_slice(&[CR, CR, LF]);
    out
}

/// The `CR CR LF ETX` suffix appended after the payload.
#[must_use]
pub const fn suffix() -> [u8; 4] {
    [CR, CR, LF, ETX]
}
