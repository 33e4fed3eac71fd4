/// Best-effort resolution of the account that owns a filesystem entry.
///
/// Unix resolves the owning uid through `getpwuid_r` and caches the result
/// per uid, since a scan sees the same handful of owners millions of times.
/// Windows reads the owner SID from the security descriptor and looks up
/// its account name. Any failure yields [`UNKNOWN_OWNER`].
use crate::model::UNKNOWN_OWNER;
use compact_str::CompactString;
use std::fs::Metadata;
use std::path::Path;

#[cfg(unix)]
use parking_lot::RwLock;
#[cfg(unix)]
use std::collections::HashMap;

/// Resolves owners for the entries of one scan.
///
/// Shared by reference across the builder's probe workers.
#[derive(Debug)]
pub struct OwnerResolver {
    enabled: bool,
    #[cfg(unix)]
    by_uid: RwLock<HashMap<u32, Option<CompactString>>>,
}

impl OwnerResolver {
    /// Create a resolver. A disabled resolver returns an empty owner for
    /// every entry without touching the filesystem.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            #[cfg(unix)]
            by_uid: RwLock::new(HashMap::new()),
        }
    }

    /// Owner of `path`, or [`UNKNOWN_OWNER`] when it cannot be resolved.
    ///
    /// `meta` is the entry's already-read metadata; the lookup itself is
    /// independent of it succeeding for size and timestamps.
    pub fn resolve(&self, path: &Path, meta: &Metadata) -> CompactString {
        if !self.enabled {
            return CompactString::default();
        }
        self.lookup(path, meta)
            .unwrap_or_else(|| CompactString::const_new(UNKNOWN_OWNER))
    }

    #[cfg(unix)]
    fn lookup(&self, _path: &Path, meta: &Metadata) -> Option<CompactString> {
        use std::os::unix::fs::MetadataExt;

        let uid = meta.uid();
        if let Some(cached) = self.by_uid.read().get(&uid) {
            return cached.clone();
        }
        let name = account_name_for_uid(uid);
        self.by_uid.write().insert(uid, name.clone());
        name
    }

    #[cfg(windows)]
    fn lookup(&self, path: &Path, _meta: &Metadata) -> Option<CompactString> {
        account_name_for_path(path)
    }

    #[cfg(not(any(unix, windows)))]
    fn lookup(&self, _path: &Path, _meta: &Metadata) -> Option<CompactString> {
        None
    }
}

#[cfg(unix)]
fn account_name_for_uid(uid: u32) -> Option<CompactString> {
    use std::ffi::CStr;

    // Grown on ERANGE; capped so a broken NSS module cannot make us loop.
    const MAX_BUFFER: usize = 1 << 16;

    let mut buffer: Vec<libc::c_char> = vec![0; 1024];
    loop {
        let mut entry: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(
                uid as libc::uid_t,
                &mut entry,
                buffer.as_mut_ptr(),
                buffer.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buffer.len() < MAX_BUFFER {
            let grown = buffer.len() * 2;
            buffer.resize(grown, 0);
            continue;
        }
        if rc != 0 || result.is_null() || entry.pw_name.is_null() {
            return None;
        }
        // SAFETY: `pw_name` points into `buffer`, which outlives this read.
        let name = unsafe { CStr::from_ptr(entry.pw_name) };
        return Some(CompactString::new(name.to_string_lossy()));
    }
}

#[cfg(windows)]
fn account_name_for_path(path: &Path) -> Option<CompactString> {
    use windows::core::{HSTRING, PCWSTR, PWSTR};
    use windows::Win32::Foundation::{LocalFree, ERROR_SUCCESS, HLOCAL};
    use windows::Win32::Security::Authorization::{GetNamedSecurityInfoW, SE_FILE_OBJECT};
    use windows::Win32::Security::{
        LookupAccountSidW, OWNER_SECURITY_INFORMATION, PSECURITY_DESCRIPTOR, PSID, SID_NAME_USE,
    };

    let wide = HSTRING::from(path.as_os_str());
    let mut owner = PSID::default();
    let mut descriptor = PSECURITY_DESCRIPTOR::default();

    let status = unsafe {
        GetNamedSecurityInfoW(
            &wide,
            SE_FILE_OBJECT,
            OWNER_SECURITY_INFORMATION,
            Some(&mut owner),
            None,
            None,
            None,
            &mut descriptor,
        )
    };
    if status != ERROR_SUCCESS {
        return None;
    }

    let mut name = [0u16; 256];
    let mut name_len = name.len() as u32;
    let mut domain = [0u16; 256];
    let mut domain_len = domain.len() as u32;
    let mut sid_use = SID_NAME_USE::default();

    let looked_up = unsafe {
        LookupAccountSidW(
            PCWSTR::null(),
            owner,
            PWSTR(name.as_mut_ptr()),
            &mut name_len,
            PWSTR(domain.as_mut_ptr()),
            &mut domain_len,
            &mut sid_use,
        )
    };

    // The SID points into the descriptor, so free only after the lookup.
    unsafe {
        let _ = LocalFree(HLOCAL(descriptor.0));
    }

    looked_up.ok()?;
    Some(CompactString::new(String::from_utf16_lossy(
        &name[..name_len as usize],
    )))
}
