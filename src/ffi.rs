//! FFI bindings for the rage tracker engine
//!
//! C-compatible functions so a capture loop written in another language can
//! drive one session handle per tracking session. Strings cross the boundary
//! as null-terminated UTF-8; every string returned here is heap-allocated and
//! must be released with `rage_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::aggregator::SessionAggregator;
use crate::config::EngineConfig;
use crate::error::TrackerError;
use crate::pipeline::ndjson_to_summary_json;
use crate::types::FeatureSample;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Borrow a required C string argument.
///
/// # Safety
/// `ptr` must be NULL or point to a valid null-terminated string.
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Borrow an optional C string argument. NULL is `Ok(None)`; a non-NULL
/// pointer that is not UTF-8 is an error.
///
/// # Safety
/// `ptr` must be NULL or point to a valid null-terminated string.
unsafe fn optional_cstr(ptr: *const c_char, what: &str) -> Result<Option<String>, String> {
    if ptr.is_null() {
        return Ok(None);
    }
    match cstr_to_string(ptr) {
        Some(s) => Ok(Some(s)),
        None => Err(format!("{what} is not valid UTF-8")),
    }
}

/// Hand a Rust string to the caller (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => {
            set_last_error("Result contains an interior NUL byte");
            ptr::null_mut()
        }
    }
}

fn json_result(result: Result<String, TrackerError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Session API
// ============================================================================

/// Opaque handle to a live tracking session
pub struct RageSessionHandle {
    session: SessionAggregator,
}

/// Start a new tracking session.
///
/// # Safety
/// - `game` must be a valid null-terminated C string.
/// - `config_json` may be NULL (Balanced defaults) or a valid C string with an
///   engine config.
/// - Returns NULL on error; call `rage_last_error` to get the error message.
/// - The handle must be freed with `rage_session_free`.
#[no_mangle]
pub unsafe extern "C" fn rage_session_new(
    game: *const c_char,
    config_json: *const c_char,
) -> *mut RageSessionHandle {
    clear_last_error();

    let game = match cstr_to_string(game) {
        Some(s) => s,
        None => {
            set_last_error("Invalid game string pointer");
            return ptr::null_mut();
        }
    };

    let config = match optional_cstr(config_json, "config_json") {
        Ok(Some(json)) => match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
        Ok(None) => EngineConfig::default(),
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let handle = Box::new(RageSessionHandle {
        session: SessionAggregator::new(game, config),
    });
    Box::into_raw(handle)
}

/// Free a session.
///
/// # Safety
/// - `session` must be NULL or a pointer returned by `rage_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rage_session_free(session: *mut RageSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Feed one frame and return the `FrameOutcome` as JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `rage_session_new`.
/// - `sample_json` is NULL when no face was detected, otherwise a valid C
///   string holding a feature sample (the JSON literal `null` also means no
///   face).
/// - Returns a newly allocated string that must be freed with `rage_free_string`.
/// - Returns NULL on error; call `rage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rage_session_record_frame(
    session: *mut RageSessionHandle,
    elapsed_seconds: f64,
    sample_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }
    let handle = &mut *session;

    let sample = match optional_cstr(sample_json, "sample_json") {
        Ok(Some(json)) => match serde_json::from_str::<Option<FeatureSample>>(&json) {
            Ok(sample) => sample,
            Err(e) => {
                set_last_error(&TrackerError::from(e).to_string());
                return ptr::null_mut();
            }
        },
        Ok(None) => None,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    let outcome = handle.session.record_frame(elapsed_seconds, sample);
    json_result(
        serde_json::to_string(&outcome).map_err(|e| TrackerError::EncodingError(e.to_string())),
    )
}

/// Clear the session's counts, history, streaks, and peaks.
///
/// # Safety
/// - `session` must be a valid pointer returned by `rage_session_new`.
/// - Returns 0 on success, -1 on a NULL handle.
#[no_mangle]
pub unsafe extern "C" fn rage_session_reset(session: *mut RageSessionHandle) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    (*session).session.reset();
    0
}

/// Snapshot the session summary as JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `rage_session_new`.
/// - Returns a newly allocated string that must be freed with `rage_free_string`.
/// - Returns NULL on error; call `rage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rage_session_summary(session: *const RageSessionHandle) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }
    let summary = (*session).session.summarize();
    json_result(
        serde_json::to_string(&summary).map_err(|e| TrackerError::EncodingError(e.to_string())),
    )
}

// ============================================================================
// Stateless API
// ============================================================================

/// Replay an NDJSON frame stream and return the summary JSON.
///
/// # Safety
/// - `game` and `ndjson` must be valid null-terminated C strings.
/// - `config_json` may be NULL (Balanced defaults).
/// - Returns a newly allocated string that must be freed with `rage_free_string`.
/// - Returns NULL on error; call `rage_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn rage_replay_to_summary(
    game: *const c_char,
    ndjson: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let game = match cstr_to_string(game) {
        Some(s) => s,
        None => {
            set_last_error("Invalid game string pointer");
            return ptr::null_mut();
        }
    };

    let ndjson = match cstr_to_string(ndjson) {
        Some(s) => s,
        None => {
            set_last_error("Invalid NDJSON string pointer");
            return ptr::null_mut();
        }
    };

    let config = match optional_cstr(config_json, "config_json") {
        Ok(config) => config,
        Err(msg) => {
            set_last_error(&msg);
            return ptr::null_mut();
        }
    };

    json_result(ndjson_to_summary_json(&game, &ndjson, config.as_deref()))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by this library.
///
/// # Safety
/// - `ptr` must be a pointer returned by a `rage_*` function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn rage_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next `rage_*` call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if the last call succeeded.
#[no_mangle]
pub unsafe extern "C" fn rage_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn rage_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
