//! Single-writer guard for a store directory.
//!
//! The journal format tolerates crashes but not interleaved writers, so a
//! store directory is claimed with an advisory OS lock before anything is
//! read. The claim lives in a `.lock` file and lapses when the process
//! exits or the guard is dropped.

use std::fs::{File, OpenOptions};
use std::io::{Error as IoError, ErrorKind, Result as IoResult};
use std::path::{Path, PathBuf};

/// Name of the guard file inside a store directory.
const LOCK_FILE: &str = ".lock";

/// Advisory exclusive claim on a store directory.
///
/// Dropping the guard releases the claim.
#[derive(Debug)]
pub struct StoreLock {
    _guard: File,
    path: PathBuf,
}

impl StoreLock {
    /// Claim `dir` for this process, failing fast if someone else holds it.
    ///
    /// # Errors
    /// - `ErrorKind::WouldBlock` when another process owns the claim
    /// - any I/O error from creating the guard file
    pub fn acquire(dir: &Path) -> IoResult<Self> {
        let path = dir.join(LOCK_FILE);
        let guard = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)?;
        lock_exclusive(&guard)?;
        Ok(Self {
            _guard: guard,
            path,
        })
    }

    /// Where the guard file lives.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn contended() -> IoError {
    IoError::new(
        ErrorKind::WouldBlock,
        "store directory is locked by another process",
    )
}

#[cfg(unix)]
fn lock_exclusive(guard: &File) -> IoResult<()> {
    use std::os::unix::io::AsRawFd;

    // LOCK_NB: fail immediately instead of queueing behind the holder.
    if unsafe { libc::flock(guard.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) } == 0 {
        return Ok(());
    }

    let err = IoError::last_os_error();
    if err.raw_os_error() == Some(libc::EWOULDBLOCK) {
        return Err(contended());
    }
    Err(err)
}

#[cfg(windows)]
fn lock_exclusive(guard: &File) -> IoResult<()> {
    use std::os::windows::io::AsRawHandle;
    use windows_sys::Win32::Foundation::HANDLE;
    use windows_sys::Win32::Storage::FileSystem::{
        LockFileEx, LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY,
    };
    use windows_sys::Win32::System::IO::OVERLAPPED;

    let claimed = unsafe {
        let mut overlapped = std::mem::zeroed::<OVERLAPPED>();
        LockFileEx(
            guard.as_raw_handle() as HANDLE,
            LOCKFILE_EXCLUSIVE_LOCK | LOCKFILE_FAIL_IMMEDIATELY,
            0,
            1,
            0,
            &mut overlapped,
        )
    };

    if claimed == 0 {
        return Err(contended());
    }
    Ok(())
}

#[cfg(not(any(unix, windows)))]
fn lock_exclusive(_guard: &File) -> IoResult<()> {
    Err(IoError::new(
        ErrorKind::Unsupported,
        "no file locking primitive on this platform",
    ))
}
