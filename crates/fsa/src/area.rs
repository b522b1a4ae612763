//! The mapped file itself: attaching, resolving host indices, and the
//! locked read/write path into individual records.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;
use std::path::Path;

use memmap2::MmapMut;

use crate::error::FsaError;
use crate::header::{Header, HEADER_LEN};
use crate::lock::{LockGuard, Region};
use crate::record::{HostRecord, RECORD_SIZE};

/// A memory-mapped shared status area attached by one AFD process.
///
/// Every process that needs to read or mutate host status opens its own
/// `SharedStatusArea` over the same path; the OS's shared mapping and the
/// byte-range locks in [`crate::lock`] are what make concurrent processes
/// safe, not anything held in this struct.
pub struct SharedStatusArea {
    file: File,
    mmap: MmapMut,
    header: Header,
    index: HashMap<String, u32>,
}

impl SharedStatusArea {
    /// Opens the file at `path`, creating and initializing it for
    /// `aliases.len()` hosts if it does not already exist.
    ///
    /// `aliases` gives the stable alias-to-index mapping for this attach;
    /// the on-disk format itself stores only numeric records, the same way
    /// the specification's FSA/FRA files carry no host names; the index is
    /// rebuilt by every process from its own host configuration, in the same
    /// order, at startup.
    pub fn attach<P: AsRef<Path>>(path: P, aliases: &[String]) -> Result<Self, FsaError> {
        let path = path.as_ref();
        let existed = path.exists();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        if !existed || file.metadata()?.len() == 0 {
            Self::initialize(&file, aliases.len() as u32)?;
        }

        // SAFETY: `file` stays open for the lifetime of this `MmapMut`
        // (it is moved into the returned struct alongside the mapping), and
        // the file was just created or validated to be at least
        // `HEADER_LEN` bytes long below.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        if mmap.len() < HEADER_LEN {
            return Err(FsaError::HeaderMismatch {
                expected_magic: crate::header::MAGIC,
                found_magic: 0,
            });
        }

        let header = Header::read_from(&mmap);
        if header.magic != crate::header::MAGIC {
            return Err(FsaError::HeaderMismatch {
                expected_magic: crate::header::MAGIC,
                found_magic: header.magic,
            });
        }

        let index = aliases
            .iter()
            .enumerate()
            .map(|(i, alias)| (alias.clone(), i as u32))
            .collect();

        Ok(Self {
            file,
            mmap,
            header,
            index,
        })
    }

    fn initialize(file: &File, element_count: u32) -> Result<(), FsaError> {
        let header = Header::new(element_count, RECORD_SIZE as u32);
        file.set_len(header.total_len() as u64)?;
        // SAFETY: `file` was just sized to `header.total_len()` bytes above
        // and is not shared with another mapping yet.
        let mut mmap = unsafe { MmapMut::map_mut(file)? };
        header.write_into(&mut mmap);
        let blank = HostRecord::default();
        for i in 0..element_count {
            let base = HEADER_LEN + i as usize * RECORD_SIZE;
            blank.write_into(&mut mmap[base..base + RECORD_SIZE]);
        }
        mmap.flush()?;
        Ok(())
    }

    /// Resolves a host alias to its stable record index.
    pub fn lookup_host(&self, alias: &str) -> Result<u32, FsaError> {
        self.index
            .get(alias)
            .copied()
            .ok_or_else(|| FsaError::NotFound(alias.to_string()))
    }

    /// Returns `true` if this mapping's cached generation is behind the
    /// file's current generation, meaning the array was grown by another
    /// process and indices obtained earlier may no longer be valid.
    #[must_use]
    pub fn check_stale(&self) -> bool {
        Header::read_from(&self.mmap).generation != self.header.generation
    }

    /// Re-reads the header and refreshes the cached generation after
    /// [`Self::check_stale`] reported staleness.
    pub fn refresh(&mut self) -> Result<(), FsaError> {
        self.header = Header::read_from(&self.mmap);
        Ok(())
    }

    fn record_offset(&self, index: u32) -> Result<usize, FsaError> {
        if index >= self.header.element_count {
            return Err(FsaError::IndexOutOfBounds(index));
        }
        Ok(HEADER_LEN + index as usize * self.header.element_size as usize)
    }

    /// Acquires an exclusive advisory lock on `region` within `index`'s
    /// record.
    pub fn lock(&self, index: u32, region: Region) -> Result<LockGuard, FsaError> {
        let offset = self.record_offset(index)?;
        LockGuard::acquire(self.file.as_raw_fd(), offset as u64, region)
    }

    /// Reads the record at `index`. Callers that need a consistent view
    /// across multiple fields should hold the relevant [`Region`] lock first.
    pub fn read_host(&self, index: u32) -> Result<HostRecord, FsaError> {
        let offset = self.record_offset(index)?;
        Ok(HostRecord::read_from(&self.mmap[offset..offset + RECORD_SIZE]))
    }

    /// Writes `record` at `index`. Callers should hold the relevant
    /// [`Region`] lock for the duration of the read-modify-write they are
    /// completing.
    pub fn write_host(&mut self, index: u32, record: &HostRecord) -> Result<(), FsaError> {
        let offset = self.record_offset(index)?;
        record.write_into(&mut self.mmap[offset..offset + RECORD_SIZE]);
        Ok(())
    }

    /// Restores the invariant that `total_file_counter == 0` implies
    /// `total_file_size == 0` for every record, as documented in the crate's
    /// invariants. Intended to run once at startup before any process trusts
    /// the mapping, covering a crash that left the two counters diverged.
    pub fn self_heal(&mut self) -> Result<(), FsaError> {
        for index in 0..self.header.element_count {
            let mut record = self.read_host(index)?;
            if record.total_file_counter == 0 && record.total_file_size != 0 {
                record.total_file_size = 0;
                self.write_host(index, &record)?;
            }
        }
        Ok(())
    }

    /// Number of host records currently stored.
    #[must_use]
    pub const fn element_count(&self) -> u32 {
        self.header.element_count
    }
}
