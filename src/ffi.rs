//! FFI bindings for LiveProof
//!
//! This module provides C-compatible functions for calling LiveProof from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `liveproof_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::VerifierConfig;
use crate::pipeline::{verify_json, Verifier};

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

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Verify a request JSON with rule-based scoring and return the result JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liveproof_free_string`.
/// - Returns NULL on error; call `liveproof_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liveproof_verify_json(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match verify_json(json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Verifier API
// ============================================================================

/// Opaque handle to a Verifier
pub struct VerifierHandle {
    verifier: Verifier,
}

/// Create a Verifier, loading the trained artifact at `model_path` if it exists.
///
/// Pass NULL for `model_path` to create a rule-based verifier.
///
/// # Safety
/// - `model_path` must be NULL or a valid null-terminated C string.
/// - Must be freed with `liveproof_verifier_free`.
/// - Returns NULL on error (e.g. an artifact that exists but is invalid).
#[no_mangle]
pub unsafe extern "C" fn liveproof_verifier_new(model_path: *const c_char) -> *mut VerifierHandle {
    clear_last_error();

    let verifier = if model_path.is_null() {
        Verifier::rule_based()
    } else {
        let path = match cstr_to_string(model_path) {
            Some(s) => s,
            None => {
                set_last_error("Invalid model path string");
                return ptr::null_mut();
            }
        };

        match Verifier::from_config(&VerifierConfig::default().with_model_path(path)) {
            Ok(verifier) => verifier,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(VerifierHandle { verifier }))
}

/// Free a Verifier.
///
/// # Safety
/// - `verifier` must be a valid pointer returned by `liveproof_verifier_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn liveproof_verifier_free(verifier: *mut VerifierHandle) {
    if !verifier.is_null() {
        drop(Box::from_raw(verifier));
    }
}

/// Verify a request JSON with a Verifier.
///
/// # Safety
/// - `verifier` must be a valid pointer returned by `liveproof_verifier_new`.
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `liveproof_free_string`.
/// - Returns NULL on error; call `liveproof_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liveproof_verifier_verify(
    verifier: *const VerifierHandle,
    json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if verifier.is_null() {
        set_last_error("Null verifier pointer");
        return ptr::null_mut();
    }

    let handle = &*verifier;

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match handle.verifier.verify_json(&json_str) {
        Ok(result) => string_to_cstr(&result),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get Verifier diagnostics as JSON.
///
/// # Safety
/// - `verifier` must be a valid pointer returned by `liveproof_verifier_new`.
/// - Returns a newly allocated string that must be freed with `liveproof_free_string`.
/// - Returns NULL on error; call `liveproof_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn liveproof_verifier_stats(verifier: *const VerifierHandle) -> *mut c_char {
    clear_last_error();

    if verifier.is_null() {
        set_last_error("Null verifier pointer");
        return ptr::null_mut();
    }

    let handle = &*verifier;

    match serde_json::to_string(&handle.verifier.stats()) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by LiveProof functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a LiveProof function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn liveproof_free_string(ptr: *mut c_char) {
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
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next LiveProof function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn liveproof_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the LiveProof library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn liveproof_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
