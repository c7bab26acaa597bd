//! Best-effort huge-page advice for a fill target.
#![allow(unsafe_code)]

/// Ask the kernel to back `[ptr, ptr + len)` with transparent huge pages.
///
/// The request is widened to whole pages, issued once and never checked:
/// the kernel may ignore it and the fill proceeds either way. No-op on
/// targets without `MADV_HUGEPAGE`.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn advise_huge_pages(ptr: *const u8, len: usize) {
    if ptr.is_null() || len == 0 {
        return;
    }
    let page = page_size();
    let start = ptr as usize & !(page - 1);
    let span = len + (ptr as usize - start);
    // SAFETY: madvise never touches the pages' contents; MADV_HUGEPAGE only
    // changes how the range is backed. The result is ignored.
    unsafe {
        libc::madvise(start as *mut libc::c_void, span, libc::MADV_HUGEPAGE);
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn advise_huge_pages(_ptr: *const u8, _len: usize) {}

#[cfg(any(target_os = "linux", target_os = "android"))]
fn page_size() -> usize {
    // SAFETY: sysconf has no preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size > 0 && (size as usize).is_power_of_two() {
        size as usize
    } else {
        4096
    }
}
