//! Lock-notation naming for an in-flight upload (specification §4.5,
//! "Dot notation" / "Unique / sequence locking").

use afd_core::LockPolicy;

/// The remote name an upload should target while still in flight.
#[must_use]
pub fn in_flight_name(original: &str, policy: LockPolicy, unique_number: u64, attempt: u32, postfix_suffix: &str) -> String {
    match policy {
        LockPolicy::None | LockPolicy::LockFile => original.to_string(),
        LockPolicy::Dot | LockPolicy::DotVms => format!(".{original}"),
        LockPolicy::Postfix => format!("{original}{postfix_suffix}"),
        LockPolicy::Unique => format!("{original}.{unique_number}"),
        LockPolicy::Sequence => format!("{original}-{attempt}"),
    }
}

/// The final remote name an in-flight upload is renamed to after close.
///
/// Only `DotVms` changes the final name (it carries a trailing `.`); every
/// other policy's in-flight decoration is stripped back to `original`.
#[must_use]
pub fn final_name(original: &str, policy: LockPolicy) -> String {
    match policy {
        LockPolicy::DotVms => format!("{original}."),
        _ => original.to_string(),
    }
}

/// The previous attempt's sequence-locked name, to `DELE` before retrying
/// under `SEQUENCE_LOCKING` (specification: "on retries > 0 the previous
/// attempt's lock file is DELE'd first").
#[must_use]
pub fn previous_sequence_name(original: &str, attempt: u32) -> Option<String> {
    attempt.checked_sub(1).map(|previous| format!("{original}-{previous}"))
}
