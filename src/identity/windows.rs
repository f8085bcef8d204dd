use super::{FileIdentity, LinkInfo};
use std::fs::OpenOptions;
use std::io;
use std::os::windows::fs::OpenOptionsExt;
use std::os::windows::io::AsRawHandle;
use std::path::Path;

const FILE_SHARE_READ: u32 = 0x0000_0001;
const FILE_SHARE_WRITE: u32 = 0x0000_0002;
const FILE_SHARE_DELETE: u32 = 0x0000_0004;
const FILE_FLAG_BACKUP_SEMANTICS: u32 = 0x0200_0000;
const FILE_FLAG_OPEN_REPARSE_POINT: u32 = 0x0020_0000;

#[repr(C)]
#[allow(non_snake_case)]
struct ByHandleFileInformation {
    dwFileAttributes: u32,
    ftCreationTime: [u32; 2],
    ftLastAccessTime: [u32; 2],
    ftLastWriteTime: [u32; 2],
    dwVolumeSerialNumber: u32,
    nFileSizeHigh: u32,
    nFileSizeLow: u32,
    nNumberOfLinks: u32,
    nFileIndexHigh: u32,
    nFileIndexLow: u32,
}

#[link(name = "kernel32")]
extern "system" {
    fn GetFileInformationByHandle(
        hFile: *mut std::ffi::c_void,
        lpFileInformation: *mut ByHandleFileInformation,
    ) -> i32;
}

/// Opens a metadata-only handle and queries it.
///
/// Symlinks and junctions are opened with `FILE_FLAG_OPEN_REPARSE_POINT`,
/// otherwise `CreateFile` would resolve them to their target.
pub(super) fn link_info(path: &Path) -> io::Result<LinkInfo> {
    let meta = std::fs::symlink_metadata(path)?;

    let mut flags = FILE_FLAG_BACKUP_SEMANTICS;
    if meta.file_type().is_symlink() {
        flags |= FILE_FLAG_OPEN_REPARSE_POINT;
    }

    let file = OpenOptions::new()
        .access_mode(0)
        .share_mode(FILE_SHARE_READ | FILE_SHARE_WRITE | FILE_SHARE_DELETE)
        .custom_flags(flags)
        .open(path)?;

    // SAFETY: zeroed is a valid bit pattern for this plain-data struct.
    let mut info: ByHandleFileInformation = unsafe { std::mem::zeroed() };
    // SAFETY: the handle stays open for the duration of the call because
    // `file` outlives it.
    let ok = unsafe { GetFileInformationByHandle(file.as_raw_handle() as *mut _, &mut info) };
    if ok == 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(LinkInfo {
        identity: FileIdentity {
            device: u64::from(info.dwVolumeSerialNumber),
            serial: (u64::from(info.nFileIndexHigh) << 32) | u64::from(info.nFileIndexLow),
        },
        links: u64::from(info.nNumberOfLinks),
    })
}
