//! Fixed-size, on-disk layout of one host's record in the shared status area.
//!
//! Values are read and written through explicit byte offsets rather than
//! `#[repr(C)]` transmutes: the layout is small, stable, and this keeps every
//! unsafe operation confined to [`crate::area`]'s mmap creation and
//! [`crate::lock`]'s byte-range locking.

use afd_core::job::ConnectStatus;
use afd_core::outcome::TransientKind;
use afd_core::{ErrorHistory, HostStatus, JobSlotStatus};

/// Maximum concurrent worker slots tracked per host record.
pub const MAX_SLOTS: usize = 8;
/// Bytes reserved for an in-flight file name within a slot.
const NAME_LEN: usize = 200;
/// Size in bytes of one packed slot.
const SLOT_SIZE: usize = 1 + 4 + 4 + 8 + 8 + 8 + 8 + 1 + 8 + 4 + 2 + NAME_LEN;
/// Byte offset of the slot array within a host record.
const SLOTS_OFFSET: usize = 32;
/// Total size in bytes of one packed host record.
pub const RECORD_SIZE: usize = SLOTS_OFFSET + MAX_SLOTS * SLOT_SIZE;

fn connect_status_from_u8(v: u8) -> ConnectStatus {
    match v {
        1 => ConnectStatus::Connecting,
        2 => ConnectStatus::FtpActive,
        3 => ConnectStatus::FtpBurstActive,
        4 => ConnectStatus::Closing,
        5 => ConnectStatus::NotWorking,
        _ => ConnectStatus::Disconnect,
    }
}

const fn connect_status_to_u8(v: ConnectStatus) -> u8 {
    match v {
        ConnectStatus::Disconnect => 0,
        ConnectStatus::Connecting => 1,
        ConnectStatus::FtpActive => 2,
        ConnectStatus::FtpBurstActive => 3,
        ConnectStatus::Closing => 4,
        ConnectStatus::NotWorking => 5,
    }
}

fn transient_kind_from_u8(v: u8) -> Option<TransientKind> {
    use TransientKind::{
        AuthError, ChdirError, CloseRemoteError, ConnectError, MoveRemoteError, OpenRemoteError,
        ReadLocalError, RemoveLockfileError, Timeout, TypeError, WriteLockError, WriteRemoteError,
    };
    Some(match v {
        1 => ConnectError,
        2 => AuthError,
        3 => TypeError,
        4 => ChdirError,
        5 => OpenRemoteError,
        6 => WriteRemoteError,
        7 => CloseRemoteError,
        8 => MoveRemoteError,
        9 => ReadLocalError,
        10 => WriteLockError,
        11 => RemoveLockfileError,
        12 => Timeout,
        _ => return None,
    })
}

const fn transient_kind_to_u8(v: TransientKind) -> u8 {
    match v {
        TransientKind::ConnectError => 1,
        TransientKind::AuthError => 2,
        TransientKind::TypeError => 3,
        TransientKind::ChdirError => 4,
        TransientKind::OpenRemoteError => 5,
        TransientKind::WriteRemoteError => 6,
        TransientKind::CloseRemoteError => 7,
        TransientKind::MoveRemoteError => 8,
        TransientKind::ReadLocalError => 9,
        TransientKind::WriteLockError => 10,
        TransientKind::RemoveLockfileError => 11,
        TransientKind::Timeout => 12,
    }
}

/// The fields the specification groups under a host's FSA record, decoded
/// into plain Rust values for callers to read and mutate.
#[derive(Clone, Debug, Default)]
pub struct HostRecord {
    pub active_transfers: u8,
    pub error_counter: u32,
    pub host_status: HostStatus,
    pub error_history: ErrorHistory,
    pub total_file_counter: u64,
    pub total_file_size: u64,
    pub slots: [JobSlotStatus; MAX_SLOTS],
}

impl HostRecord {
    /// Decodes one record from an `element_size`-byte slice.
    ///
    /// Only the first [`RECORD_SIZE`] bytes are interpreted; callers on a
    /// newer layout version should not reach this path (the header version
    /// check in [`crate::area`] rejects the mapping first).
    #[must_use]
    pub fn read_from(bytes: &[u8]) -> Self {
        let active_transfers = bytes[0];
        let error_counter = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
        let host_status = read_host_status(u32::from_le_bytes(bytes[8..12].try_into().unwrap()));
        let mut error_history = ErrorHistory::default();
        if let Some(k) = transient_kind_from_u8(bytes[12]) {
            error_history.push(k);
        }
        if let Some(k) = transient_kind_from_u8(bytes[13]) {
            error_history.push(k);
        }
        let total_file_counter = u64::from_le_bytes(bytes[16..24].try_into().unwrap());
        let total_file_size = u64::from_le_bytes(bytes[24..32].try_into().unwrap());

        let mut slots: [JobSlotStatus; MAX_SLOTS] = Default::default();
        for (i, slot) in slots.iter_mut().enumerate() {
            let base = SLOTS_OFFSET + i * SLOT_SIZE;
            *slot = read_slot(&bytes[base..base + SLOT_SIZE]);
        }

        Self {
            active_transfers,
            error_counter,
            host_status,
            error_history,
            total_file_counter,
            total_file_size,
            slots,
        }
    }

    /// Encodes this record into an `element_size`-byte slice.
    pub fn write_into(&self, bytes: &mut [u8]) {
        bytes[0] = self.active_transfers;
        bytes[4..8].copy_from_slice(&self.error_counter.to_le_bytes());
        bytes[8..12].copy_from_slice(&host_status_bits(self.host_status).to_le_bytes());
        let entries = self.error_history.entries();
        bytes[12] = entries[0].map_or(0, transient_kind_to_u8);
        bytes[13] = entries[1].map_or(0, transient_kind_to_u8);
        bytes[16..24].copy_from_slice(&self.total_file_counter.to_le_bytes());
        bytes[24..32].copy_from_slice(&self.total_file_size.to_le_bytes());

        for (i, slot) in self.slots.iter().enumerate() {
            let base = SLOTS_OFFSET + i * SLOT_SIZE;
            write_slot(slot, &mut bytes[base..base + SLOT_SIZE]);
        }
    }
}

fn read_host_status(bits: u32) -> HostStatus {
    // HostStatus has no public constructor from raw bits; reconstruct via the
    // public combinable constants so this stays in sync if new flags appear.
    let mut status = HostStatus::none();
    for (mask, flag) in [
        (1u32 << 0, HostStatus::DISABLED),
        (1 << 1, HostStatus::PAUSED),
        (1 << 2, HostStatus::STOP_TRANSFER),
        (1 << 3, HostStatus::AUTO_PAUSED),
        (1 << 4, HostStatus::ERROR_OFFLINE),
        (1 << 5, HostStatus::HOST_TWO_ACTIVE),
    ] {
        if bits & mask != 0 {
            status = status.insert(flag);
        }
    }
    status
}

fn host_status_bits(status: HostStatus) -> u32 {
    let mut bits = 0u32;
    for (mask, flag) in [
        (1u32 << 0, HostStatus::DISABLED),
        (1 << 1, HostStatus::PAUSED),
        (1 << 2, HostStatus::STOP_TRANSFER),
        (1 << 3, HostStatus::AUTO_PAUSED),
        (1 << 4, HostStatus::ERROR_OFFLINE),
        (1 << 5, HostStatus::HOST_TWO_ACTIVE),
    ] {
        if status.contains(flag) {
            bits |= mask;
        }
    }
    bits
}

fn read_slot(bytes: &[u8]) -> JobSlotStatus {
    let connect_status = connect_status_from_u8(bytes[0]);
    let files_to_send = u32::from_le_bytes(bytes[1..5].try_into().unwrap());
    let files_done = u32::from_le_bytes(bytes[5..9].try_into().unwrap());
    let file_size_to_send = u64::from_le_bytes(bytes[9..17].try_into().unwrap());
    let file_size_done = u64::from_le_bytes(bytes[17..25].try_into().unwrap());
    let file_size_in_use = u64::from_le_bytes(bytes[25..33].try_into().unwrap());
    let file_size_in_use_done = u64::from_le_bytes(bytes[33..41].try_into().unwrap());
    let has_job = bytes[41] != 0;
    let job_id_in_use = u64::from_le_bytes(bytes[42..50].try_into().unwrap());
    let burst_counter = u32::from_le_bytes(bytes[50..54].try_into().unwrap());
    let name_len = u16::from_le_bytes(bytes[54..56].try_into().unwrap()) as usize;
    let name_bytes = &bytes[56..56 + name_len.min(NAME_LEN)];
    let file_name_in_use = if name_len == 0 {
        None
    } else {
        Some(String::from_utf8_lossy(name_bytes).into_owned())
    };

    JobSlotStatus {
        connect_status,
        files_to_send,
        files_done,
        file_size_to_send,
        file_size_done,
        file_size_in_use,
        file_size_in_use_done,
        file_name_in_use,
        job_id_in_use: has_job.then_some(job_id_in_use),
        burst_counter,
    }
}

fn write_slot(slot: &JobSlotStatus, bytes: &mut [u8]) {
    bytes[0] = connect_status_to_u8(slot.connect_status);
    bytes[1..5].copy_from_slice(&slot.files_to_send.to_le_bytes());
    bytes[5..9].copy_from_slice(&slot.files_done.to_le_bytes());
    bytes[9..17].copy_from_slice(&slot.file_size_to_send.to_le_bytes());
    bytes[17..25].copy_from_slice(&slot.file_size_done.to_le_bytes());
    bytes[25..33].copy_from_slice(&slot.file_size_in_use.to_le_bytes());
    bytes[33..41].copy_from_slice(&slot.file_size_in_use_done.to_le_bytes());
    bytes[41] = u8::from(slot.job_id_in_use.is_some());
    bytes[42..50].copy_from_slice(&slot.job_id_in_use.unwrap_or(0).to_le_bytes());
    bytes[50..54].copy_from_slice(&slot.burst_counter.to_le_bytes());

    let name = slot.file_name_in_use.as_deref().unwrap_or("");
    let truncated = &name.as_bytes()[..name.len().min(NAME_LEN)];
    bytes[54..56].copy_from_slice(&(truncated.len() as u16).to_le_bytes());
    bytes[56..56 + truncated.len()].copy_from_slice(truncated);
    for b in &mut bytes[56 + truncated.len()..56 + NAME_LEN] {
        *b = 0;
    }
}
