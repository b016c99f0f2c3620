//! FFI bindings for the MyFlow engine
//!
//! This module provides C-compatible functions for calling the engine from other languages.
//! All functions use C strings (null-terminated) and return allocated memory that
//! must be freed by the caller using `myflow_free_string`.
//!
//! Error messages are prefixed with the error kind (`insufficient_data: ...`)
//! so callers can branch on the kind without parsing the rest.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::ComputeError;
use crate::pipeline::AnalysisEngine;
use crate::schema::RawLogAdapter;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn set_compute_error(err: &ComputeError) {
    set_last_error(&format!("{}: {}", err.kind(), err));
}

/// Clear the last error message
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

fn finish(result: Result<String, ComputeError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_compute_error(&e);
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Analysis API
// ============================================================================

/// Analyze a request and return the report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string holding a JSON array of
///   logs or a request envelope.
/// - `config_json` may be NULL (defaults) or a valid null-terminated C string
///   holding an engine configuration.
/// - Returns a newly allocated string that must be freed with `myflow_free_string`.
/// - Returns NULL on error; call `myflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn myflow_analyze(
    json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    let engine = if config_json.is_null() {
        AnalysisEngine::default()
    } else {
        let config_str = match cstr_to_string(config_json) {
            Some(s) => s,
            None => {
                set_last_error("Invalid config string pointer");
                return ptr::null_mut();
            }
        };
        match AnalysisEngine::from_config_json(&config_str) {
            Ok(engine) => engine,
            Err(e) => {
                set_compute_error(&e);
                return ptr::null_mut();
            }
        }
    };

    finish(engine.analyze_json(&json_str))
}

/// Score a request and return the per-day breakdown JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `myflow_free_string`.
/// - Returns NULL on error; call `myflow_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn myflow_score(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(AnalysisEngine::default().score_json(&json_str))
}

/// Validate a request and return the validation report JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `myflow_free_string`.
/// - Returns NULL when the document itself cannot be read; call `myflow_last_error`.
#[no_mangle]
pub unsafe extern "C" fn myflow_validate(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    finish(RawLogAdapter::validate_json(&json_str).and_then(|report| {
        serde_json::to_string(&report).map_err(ComputeError::JsonError)
    }))
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by MyFlow functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a MyFlow function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn myflow_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next MyFlow function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn myflow_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the engine version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn myflow_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
