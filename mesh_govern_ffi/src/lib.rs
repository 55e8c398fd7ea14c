#![allow(clippy::missing_safety_doc)]

use std::collections::BTreeMap;
use std::os::raw::c_void;
use std::ptr;

use mesh_govern_core::{
    check_domain_consensus, predict_outcome, reallocate_quota, DomainLog, GovernCfg,
    OverrideContext, OverridePrognosis, VerdictTally,
};
use mesh_govern_supervisor::supervisor::RegistrySnapshot;
use mesh_govern_supervisor::{BasicSignalBuilder, GovernSupervisor, TelemetryEvent};

/// FFI ABI version for mesh_govern_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function
/// signature changes.
pub const MESH_GOVERN_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn mesh_govern_ffi_version() -> u32 {
    MESH_GOVERN_FFI_VERSION
}

// Snapshot wire format identification.
const SNAP_MAGIC: u32 = 0x3156_4f47; // "GOV1" little-endian
const SNAP_VERSION: u32 = 1;

/// Opaque handle exposed over FFI.
#[repr(C)]
pub struct MgGovernSupervisor {
    inner: GovernSupervisor,
    builder: BasicSignalBuilder,
}

/// FFI string view (UTF-8 bytes).
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MgStr {
    pub ptr: *const u8,
    pub len: usize,
}

impl MgStr {
    fn as_str(&self) -> Option<&str> {
        if self.ptr.is_null() {
            return None;
        }
        let bytes = unsafe { std::slice::from_raw_parts(self.ptr, self.len) };
        std::str::from_utf8(bytes).ok()
    }
}

/// Owned byte buffer returned over FFI. Free with `mesh_govern_bytes_free`.
#[repr(C)]
pub struct MgBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl MgBytes {
    fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
        }
    }

    fn from_vec(v: Vec<u8>) -> Self {
        let mut boxed = v.into_boxed_slice();
        let ptr = boxed.as_mut_ptr();
        let len = boxed.len();
        std::mem::forget(boxed);
        Self { ptr, len }
    }
}

/// One row of the cross-domain agreement check.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MgDomainLog {
    pub domain: MgStr,
    pub signal: MgStr,
}

/// FFI input event for ingest.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MgEvent {
    pub domain: MgStr,
    pub signal: MgStr,
    pub timestamp: u64,
    /// Optional single commentary line (may be null).
    pub commentary: MgStr,
}

/// Prognosis as a C-friendly enum.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MgPrognosis {
    Unknown = 0,
    RestoreSovereignty = 1,
    TriggerReallocation = 2,
}

/// Tribunal ruling (FFI-safe). `verdict_index` points into the caller's
/// label table. `rc == 0` means the other fields are valid.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct MgRuling {
    pub verdict_index: u32,
    pub votes: u32,
    pub total: u32,
    pub tied: u8,
    pub rc: i32,
}

impl MgRuling {
    fn err(rc: i32) -> Self {
        Self {
            verdict_index: 0,
            votes: 0,
            total: 0,
            tied: 0,
            rc,
        }
    }
}

/// Restore result statistics (FFI-safe).
#[repr(C)]
pub struct MgRestoreStats {
    pub applied: u32,
    pub overwritten: u32,
    pub rc: i32,
}

/// Verdict callback: returns an index into the caller's label table.
pub type MgVerdictFn = unsafe extern "C" fn(signal: MgStr, userdata: *mut c_void) -> u32;

fn prognosis_to_ffi(p: OverridePrognosis) -> MgPrognosis {
    match p {
        OverridePrognosis::Unknown => MgPrognosis::Unknown,
        OverridePrognosis::RestoreSovereignty => MgPrognosis::RestoreSovereignty,
        OverridePrognosis::TriggerReallocation => MgPrognosis::TriggerReallocation,
    }
}

/// Create a new supervisor handle with default configuration.
///
/// Notes:
/// - `shards` controls registry sharding (snapshot id -> shard).
/// - This library does not spawn threads. If you call into the same handle
///   concurrently from multiple threads, calls serialize per-shard via
///   internal mutexes.
#[no_mangle]
pub extern "C" fn mesh_govern_supervisor_new(shards: usize) -> *mut MgGovernSupervisor {
    let sup = GovernSupervisor::new(shards.max(1), GovernCfg::default());
    let handle = MgGovernSupervisor {
        inner: sup,
        builder: BasicSignalBuilder::default(),
    };
    Box::into_raw(Box::new(handle))
}

#[no_mangle]
pub unsafe extern "C" fn mesh_govern_supervisor_free(h: *mut MgGovernSupervisor) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Register (or overwrite) a recoverable state. `json` must be a UTF-8 JSON
/// document.
///
/// Returns 0 on fresh insert, 1 on overwrite, negative on invalid input.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_register_state(
    h: *mut MgGovernSupervisor,
    id: MgStr,
    json: MgStr,
) -> i32 {
    if h.is_null() {
        return -1;
    }
    let handle = &*h;
    let id = match id.as_str() {
        Some(s) if !s.is_empty() => s,
        _ => return -2,
    };
    let raw = match json.as_str() {
        Some(s) => s,
        None => return -2,
    };
    let state: serde_json::Value = match serde_json::from_str(raw) {
        Ok(v) => v,
        Err(_) => return -3,
    };
    if handle.inner.register_state(id, state) {
        1
    } else {
        0
    }
}

/// Retrieve the last recoverable state for `id`, serialized as JSON.
/// Returns an empty buffer when nothing was ever registered for the id.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_rollback(h: *mut MgGovernSupervisor, id: MgStr) -> MgBytes {
    if h.is_null() {
        return MgBytes::empty();
    }
    let handle = &*h;
    let id = match id.as_str() {
        Some(s) => s,
        None => return MgBytes::empty(),
    };
    match handle.inner.rollback(id) {
        Ok(state) => match serde_json::to_vec(&state) {
            Ok(v) => MgBytes::from_vec(v),
            Err(_) => MgBytes::empty(),
        },
        Err(_) => MgBytes::empty(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn mesh_govern_bytes_free(b: MgBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = std::ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}

/// Proportionally rebalance `total` across `len` domains by usage share.
/// Returns a JSON object mapping domain to adjusted quota.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_reallocate(
    domains_ptr: *const MgStr,
    usage_ptr: *const u64,
    len: usize,
    total: u64,
) -> MgBytes {
    if len > 0 && (domains_ptr.is_null() || usage_ptr.is_null()) {
        return MgBytes::empty();
    }

    let mut usage: BTreeMap<String, u64> = BTreeMap::new();
    if len > 0 {
        let domains = std::slice::from_raw_parts(domains_ptr, len);
        let used = std::slice::from_raw_parts(usage_ptr, len);
        for (d, u) in domains.iter().zip(used.iter()) {
            let d = match d.as_str() {
                Some(s) if !s.is_empty() => s,
                _ => return MgBytes::empty(),
            };
            usage.insert(d.to_string(), *u);
        }
    }

    let adjusted = reallocate_quota(&usage, total);
    match serde_json::to_vec(&adjusted) {
        Ok(v) => MgBytes::from_vec(v),
        Err(_) => MgBytes::empty(),
    }
}

/// Advisory prediction for a (signal, domain) pair.
#[no_mangle]
pub extern "C" fn mesh_govern_predict(signal: MgStr, domain: MgStr) -> MgPrognosis {
    let signal = match signal.as_str() {
        Some(s) => s,
        None => return MgPrognosis::Unknown,
    };
    let domain = match domain.as_str() {
        Some(s) => s,
        None => return MgPrognosis::Unknown,
    };
    prognosis_to_ffi(predict_outcome(signal, &OverrideContext::new(domain)))
}

/// Cross-domain agreement check.
///
/// Returns 1 (full agreement), 0 (divergence), or negative on empty or
/// invalid input.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_check_consensus(
    logs_ptr: *const MgDomainLog,
    len: usize,
) -> i32 {
    if logs_ptr.is_null() || len == 0 {
        return -1;
    }
    let raw = std::slice::from_raw_parts(logs_ptr, len);

    let mut logs: Vec<DomainLog> = Vec::with_capacity(len);
    for l in raw {
        let domain = match l.domain.as_str() {
            Some(s) => s,
            None => return -2,
        };
        let signal = match l.signal.as_str() {
            Some(s) => s,
            None => return -2,
        };
        logs.push(DomainLog::new(domain, signal));
    }

    match check_domain_consensus(&logs) {
        Ok(true) => 1,
        Ok(false) => 0,
        Err(_) => -1,
    }
}

/// Convene a tribunal over `signals`. For each signal the callback returns
/// an index into the caller's `labels` table; votes are tallied in
/// first-seen label order and the majority label wins (first-seen wins on
/// ties, with `tied` set).
///
/// rc: 0 ok, -1 null/invalid input, -2 empty docket, -3 invalid UTF-8,
/// -4 callback returned an out-of-range label index.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_convene(
    signals_ptr: *const MgStr,
    signals_len: usize,
    labels_ptr: *const MgStr,
    labels_len: usize,
    verdict_cb: MgVerdictFn,
    userdata: *mut c_void,
) -> MgRuling {
    if signals_ptr.is_null() || labels_ptr.is_null() || labels_len == 0 {
        return MgRuling::err(-1);
    }
    if signals_len == 0 {
        return MgRuling::err(-2);
    }

    let raw_labels = std::slice::from_raw_parts(labels_ptr, labels_len);
    let mut labels: Vec<&str> = Vec::with_capacity(labels_len);
    for l in raw_labels {
        match l.as_str() {
            Some(s) => labels.push(s),
            None => return MgRuling::err(-3),
        }
    }

    let signals = std::slice::from_raw_parts(signals_ptr, signals_len);
    let mut tally = VerdictTally::default();
    for s in signals {
        if s.as_str().is_none() {
            return MgRuling::err(-3);
        }
        let idx = verdict_cb(*s, userdata) as usize;
        if idx >= labels.len() {
            return MgRuling::err(-4);
        }
        tally.record(labels[idx]);
    }

    let ruling = match tally.ruling() {
        Some(r) => r,
        None => return MgRuling::err(-2),
    };
    let verdict_index = labels
        .iter()
        .position(|l| *l == ruling.verdict)
        .unwrap_or(0) as u32;

    MgRuling {
        verdict_index,
        votes: ruling.votes,
        total: ruling.total,
        tied: ruling.tied as u8,
        rc: 0,
    }
}

/// Ingest events through the full governance pipeline. For each signal the
/// callback returns an index into `labels`; out-of-range indices vote
/// "unknown". The returned buffer is the JSON-serialized governance report
/// (empty on error, with `rc_out` set when non-null).
///
/// rc: 0 ok, -1 null input, -2 empty or fully-malformed batch, -3 invalid
/// UTF-8 in labels.
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_ingest(
    h: *mut MgGovernSupervisor,
    events_ptr: *const MgEvent,
    events_len: usize,
    labels_ptr: *const MgStr,
    labels_len: usize,
    verdict_cb: MgVerdictFn,
    userdata: *mut c_void,
    rc_out: *mut i32,
) -> MgBytes {
    let set_rc = |rc: i32| {
        if !rc_out.is_null() {
            *rc_out = rc;
        }
    };

    if h.is_null() || events_ptr.is_null() || labels_ptr.is_null() || labels_len == 0 {
        set_rc(-1);
        return MgBytes::empty();
    }
    if events_len == 0 {
        set_rc(-2);
        return MgBytes::empty();
    }

    let handle = &*h;

    let raw_labels = std::slice::from_raw_parts(labels_ptr, labels_len);
    let mut labels: Vec<String> = Vec::with_capacity(labels_len);
    for l in raw_labels {
        match l.as_str() {
            Some(s) => labels.push(s.to_string()),
            None => {
                set_rc(-3);
                return MgBytes::empty();
            }
        }
    }

    let raw_events = std::slice::from_raw_parts(events_ptr, events_len);
    let mut events: Vec<TelemetryEvent<'_>> = Vec::with_capacity(events_len);
    for e in raw_events {
        let domain = match e.domain.as_str() {
            Some(s) => s,
            None => continue,
        };
        let signal = match e.signal.as_str() {
            Some(s) => s,
            None => continue,
        };
        let mut ev = TelemetryEvent::new(domain, signal, e.timestamp);
        if let Some(line) = e.commentary.as_str() {
            if !line.is_empty() {
                ev = ev.with_commentary(line);
            }
        }
        events.push(ev);
    }

    let adjudicator = move |signal: &str| -> String {
        let view = MgStr {
            ptr: signal.as_ptr(),
            len: signal.len(),
        };
        let idx = verdict_cb(view, userdata) as usize;
        match labels.get(idx) {
            Some(label) => label.clone(),
            None => "unknown".to_string(),
        }
    };

    match handle.inner.ingest(&handle.builder, &adjudicator, &events) {
        Ok(report) => match serde_json::to_vec(&report) {
            Ok(v) => {
                set_rc(0);
                MgBytes::from_vec(v)
            }
            Err(_) => {
                set_rc(-2);
                MgBytes::empty()
            }
        },
        Err(_) => {
            set_rc(-2);
            MgBytes::empty()
        }
    }
}

/// Snapshot format (binary, little endian):
/// [u32 magic = "GOV1"][u32 version = 1][u32 count]
/// repeated count times:
///   [u32 id_len][id bytes...][u32 blob_len][JSON blob bytes...]
#[no_mangle]
pub unsafe extern "C" fn mesh_govern_snapshot(h: *mut MgGovernSupervisor) -> MgBytes {
    if h.is_null() {
        return MgBytes::empty();
    }
    let handle = &*h;
    let snap = handle.inner.snapshot();

    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(&SNAP_MAGIC.to_le_bytes());
    buf.extend_from_slice(&SNAP_VERSION.to_le_bytes());
    buf.extend_from_slice(&(snap.entries.len() as u32).to_le_bytes());

    for (id, state) in snap.entries {
        let blob = match serde_json::to_vec(&state) {
            Ok(v) => v,
            Err(_) => return MgBytes::empty(),
        };
        let idb = id.as_bytes();
        buf.extend_from_slice(&(idb.len() as u32).to_le_bytes());
        buf.extend_from_slice(idb);
        buf.extend_from_slice(&(blob.len() as u32).to_le_bytes());
        buf.extend_from_slice(&blob);
    }

    MgBytes::from_vec(buf)
}

fn read_u32(data: &[u8], i: &mut usize) -> Option<u32> {
    if *i + 4 > data.len() {
        return None;
    }
    let v = u32::from_le_bytes(data[*i..*i + 4].try_into().ok()?);
    *i += 4;
    Some(v)
}

/// Parse a snapshot buffer, or return a negative rc describing the fault.
fn parse_snapshot(data: &[u8]) -> Result<RegistrySnapshot, i32> {
    let mut i = 0usize;

    let magic = read_u32(data, &mut i).ok_or(-2)?;
    if magic != SNAP_MAGIC {
        return Err(-8); // bad magic
    }
    let ver = read_u32(data, &mut i).ok_or(-2)?;
    if ver != SNAP_VERSION {
        return Err(-9); // unsupported version
    }

    let count = read_u32(data, &mut i).ok_or(-2)? as usize;
    let mut entries: Vec<(String, serde_json::Value)> = Vec::with_capacity(count);

    for _ in 0..count {
        let id_len = read_u32(data, &mut i).ok_or(-3)? as usize;
        if i + id_len > data.len() {
            return Err(-4);
        }
        let id = std::str::from_utf8(&data[i..i + id_len])
            .map_err(|_| -5)?
            .to_string();
        i += id_len;

        let blob_len = read_u32(data, &mut i).ok_or(-6)? as usize;
        if i + blob_len > data.len() {
            return Err(-4);
        }
        let state: serde_json::Value =
            serde_json::from_slice(&data[i..i + blob_len]).map_err(|_| -7)?;
        i += blob_len;

        entries.push((id, state));
    }

    Ok(RegistrySnapshot { entries })
}

#[no_mangle]
pub unsafe extern "C" fn mesh_govern_restore(
    h: *mut MgGovernSupervisor,
    bytes: *const u8,
    len: usize,
    merge: u8,
) -> i32 {
    let stats = mesh_govern_restore_stats(h, bytes, len, merge);
    stats.rc
}

#[no_mangle]
pub unsafe extern "C" fn mesh_govern_restore_stats(
    h: *mut MgGovernSupervisor,
    bytes: *const u8,
    len: usize,
    merge: u8,
) -> MgRestoreStats {
    if h.is_null() || bytes.is_null() || len < 12 {
        return MgRestoreStats {
            applied: 0,
            overwritten: 0,
            rc: -1,
        };
    }
    let handle = &*h;
    let data = std::slice::from_raw_parts(bytes, len);

    let snap = match parse_snapshot(data) {
        Ok(s) => s,
        Err(rc) => {
            return MgRestoreStats {
                applied: 0,
                overwritten: 0,
                rc,
            }
        }
    };

    let stats = if merge != 0 {
        handle.inner.restore_merge(snap)
    } else {
        handle.inner.restore(snap)
    };

    MgRestoreStats {
        applied: stats.applied as u32,
        overwritten: stats.overwritten as u32,
        rc: 0,
    }
}
