//! C ABI for embedding the engine in a host application.
//!
//! Hosts hold opaque integer handles rather than pointers; the
//! handle->engine mapping lives entirely on the Rust side. Every call
//! returns a JSON document (the same shapes `QueryResult` and
//! `SchemaSnapshot` serialize to) in a buffer allocated with `libc::malloc`,
//! which the host releases with `sqlsandbox_buffer_free`.
use parking_lot::Mutex;
use std::collections::HashMap;
use std::os::raw::{c_char, c_int, c_void};
use std::sync::Arc;

use crate::session::SqlEngine;

lazy_static::lazy_static! {
    static ref ENGINE_HANDLES: Mutex<HashMap<usize, Arc<SqlEngine>>> = Mutex::new(HashMap::new());
    static ref NEXT_HANDLE: Mutex<usize> = Mutex::new(1);
}

// Handles are never reused, so a stale handle can only miss, never alias
// a newer engine.
fn next_handle() -> usize {
    let mut handle = NEXT_HANDLE.lock();
    let id = *handle;
    *handle += 1;
    id
}

fn engine(handle: usize) -> Option<Arc<SqlEngine>> {
    ENGINE_HANDLES.lock().get(&handle).map(Arc::clone)
}

/// Copy `json` into a malloc'd buffer and hand it to the caller.
fn write_output(json: &str, out: *mut *mut c_char, out_len: *mut usize) -> c_int {
    if out.is_null() || out_len.is_null() {
        return -1;
    }
    let len = json.len();
    // one extra byte so the buffer is also a valid C string
    let buffer = unsafe { libc::malloc(len + 1) as *mut u8 };
    if buffer.is_null() {
        return -1;
    }
    unsafe {
        std::ptr::copy_nonoverlapping(json.as_ptr(), buffer, len);
        *buffer.add(len) = 0;
        *out = buffer as *mut c_char;
        *out_len = len;
    }
    0
}

fn write_json<T: serde::Serialize>(value: &T, out: *mut *mut c_char, out_len: *mut usize) -> c_int {
    match serde_json::to_string(value) {
        Ok(json) => write_output(&json, out, out_len),
        Err(_) => -1,
    }
}

/// Create an engine over freshly seeded databases. Returns 0 on failure.
#[no_mangle]
pub extern "C" fn sqlsandbox_engine_new() -> usize {
    let engine = Arc::new(SqlEngine::new());
    let handle = next_handle();
    ENGINE_HANDLES.lock().insert(handle, engine);
    handle
}

#[no_mangle]
pub extern "C" fn sqlsandbox_engine_free(handle: usize) {
    ENGINE_HANDLES.lock().remove(&handle);
}

/// Execute a batch of `sql_len` bytes of UTF-8. Statement errors are
/// reported inside the JSON result; a negative return means the call
/// itself was invalid (unknown handle, null pointer, bad UTF-8).
#[no_mangle]
pub extern "C" fn sqlsandbox_execute(
    handle: usize,
    sql: *const c_char,
    sql_len: usize,
    out: *mut *mut c_char,
    out_len: *mut usize,
) -> c_int {
    if sql.is_null() {
        return -1;
    }
    let engine = match engine(handle) {
        Some(e) => e,
        None => return -1,
    };

    // The host owns `sql` and promises `sql_len` readable bytes.
    let bytes = unsafe { std::slice::from_raw_parts(sql as *const u8, sql_len) };
    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s,
        Err(_) => return -1,
    };

    write_json(&engine.execute(text), out, out_len)
}

#[no_mangle]
pub extern "C" fn sqlsandbox_schema(handle: usize, out: *mut *mut c_char, out_len: *mut usize) -> c_int {
    let engine = match engine(handle) {
        Some(e) => e,
        None => return -1,
    };
    match engine.schema() {
        Ok(snapshot) => write_json(&snapshot, out, out_len),
        Err(_) => -1,
    }
}

#[no_mangle]
pub extern "C" fn sqlsandbox_reset(handle: usize, out: *mut *mut c_char, out_len: *mut usize) -> c_int {
    let engine = match engine(handle) {
        Some(e) => e,
        None => return -1,
    };
    write_json(&engine.reset(), out, out_len)
}

/// Release a buffer returned by any of the calls above.
#[no_mangle]
pub extern "C" fn sqlsandbox_buffer_free(ptr: *mut c_char) {
    if !ptr.is_null() {
        unsafe { libc::free(ptr as *mut c_void) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ptr;

    fn call_execute(handle: usize, sql: &str) -> (c_int, Option<serde_json::Value>) {
        let mut out: *mut c_char = ptr::null_mut();
        let mut len = 0usize;
        let code = sqlsandbox_execute(handle, sql.as_ptr() as *const c_char, sql.len(), &mut out, &mut len);
        if code != 0 {
            return (code, None);
        }
        let bytes = unsafe { std::slice::from_raw_parts(out as *const u8, len) };
        let value = serde_json::from_slice(bytes).unwrap();
        sqlsandbox_buffer_free(out);
        (code, Some(value))
    }

    #[test]
    fn test_execute_through_handle() {
        let handle = sqlsandbox_engine_new();
        assert_ne!(handle, 0);

        let (code, json) = call_execute(handle, "SELECT COUNT(*) AS N FROM STUDENTS");
        assert_eq!(code, 0);
        assert_eq!(json.unwrap(), serde_json::json!({ "columns": ["N"], "rows": [[10]] }));

        let (_, json) = call_execute(handle, "SELECT * FROM NOPE");
        assert_eq!(json.unwrap(), serde_json::json!({ "error": "Invalid object name 'NOPE'." }));

        sqlsandbox_engine_free(handle);
        assert_eq!(call_execute(handle, "SELECT 1").0, -1);
    }

    #[test]
    fn test_schema_and_reset_through_handle() {
        let handle = sqlsandbox_engine_new();
        call_execute(handle, "USE ShopDB");

        let mut out: *mut c_char = ptr::null_mut();
        let mut len = 0usize;
        assert_eq!(sqlsandbox_schema(handle, &mut out, &mut len), 0);
        let bytes = unsafe { std::slice::from_raw_parts(out as *const u8, len) };
        let schema: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        sqlsandbox_buffer_free(out);
        assert_eq!(schema["currentDatabase"], "ShopDB");

        assert_eq!(sqlsandbox_reset(handle, &mut out, &mut len), 0);
        let bytes = unsafe { std::slice::from_raw_parts(out as *const u8, len) };
        let reset: serde_json::Value = serde_json::from_slice(bytes).unwrap();
        sqlsandbox_buffer_free(out);
        assert_eq!(reset["rowsAffected"], 0);

        sqlsandbox_engine_free(handle);
    }

    #[test]
    fn test_null_arguments_are_rejected() {
        let handle = sqlsandbox_engine_new();
        let mut len = 0usize;
        assert_eq!(sqlsandbox_execute(handle, ptr::null(), 0, ptr::null_mut(), &mut len), -1);
        assert_eq!(sqlsandbox_schema(handle, ptr::null_mut(), &mut len), -1);
        sqlsandbox_engine_free(handle);
    }
}
