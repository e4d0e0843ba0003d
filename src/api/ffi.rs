//! C-compatible API for host applications.
//!
//! Ownership: every `*const c_char` returned here was allocated by Rust and
//! must be released with [`cropcast_free_str`]. Input strings are borrowed for
//! the duration of the call only. Null path arguments fall back to the
//! environment configuration.
//!
//! TODO: Export feature importance and the scenario tables as JSON calls.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;

use serde_json::{json, Value};
use tracing::{error, info};

use crate::common::config::{load_cfg, AppCfg};
use crate::common::error::{CropError, CropResult, ErrorCode};
use crate::common::log;
use crate::data::repo_fs::FsRecordRepo;
use crate::pipeline::CropPipeline;
use crate::training::domain::TrainConfig;

/// ABI version to coordinate with host bindings.
#[no_mangle]
pub extern "C" fn cropcast_api_version() -> u32 {
    1
}

/// Install the JSON log subscriber at `CROPCAST_LOG_LEVEL`. Returns 1 when
/// this call installed it, 0 when one was already present.
#[no_mangle]
pub extern "C" fn cropcast_init_logging() -> u32 {
    u32::from(log::init(load_cfg().log_level))
}

fn borrow_str(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned(),
    )
}

fn train_to_file(
    cfg: &AppCfg,
    data_root: Option<String>,
    train_cfg: Option<String>,
    artifact_path: Option<String>,
) -> CropResult<()> {
    let train_cfg = TrainConfig::parse(train_cfg.as_deref().unwrap_or(""))?;
    let repo = match data_root {
        Some(root) => FsRecordRepo::at(root),
        None => FsRecordRepo::new(cfg),
    };
    let artifact_path = artifact_path.unwrap_or_else(|| cfg.artifact_path.clone());

    let mut pipeline = CropPipeline::new(train_cfg);
    pipeline.fit_from_source(&repo)?;
    pipeline.save(&artifact_path)?;
    info!(ev = "ffi.train", path = artifact_path.as_str());
    Ok(())
}

/// Train from `<data_root>/<year>/crops_<year>.csv` files and write the
/// artifact. Returns an [`ErrorCode`] (0 on success).
#[no_mangle]
pub extern "C" fn cropcast_train(
    data_root: *const c_char,
    cfg_json: *const c_char,
    artifact_path: *const c_char,
) -> u32 {
    let cfg = load_cfg();
    match train_to_file(
        &cfg,
        borrow_str(data_root),
        borrow_str(cfg_json),
        borrow_str(artifact_path),
    ) {
        Ok(()) => ErrorCode::Ok as u32,
        Err(err) => {
            let code = err.code();
            error!(ev = "ffi.train_failed", code = code as u32, error = %err);
            code as u32
        }
    }
}

fn predict_from_file(cfg: &AppCfg, artifact_path: Option<String>, input: &str) -> CropResult<Value> {
    let path = artifact_path.unwrap_or_else(|| cfg.artifact_path.clone());
    let pipeline = CropPipeline::load(path)?;
    let input: Value = serde_json::from_str(input)
        .map_err(|e| CropError::invalid(format!("input is not JSON: {e}")))?;
    let prediction = match &input {
        Value::Array(rows) => serde_json::to_value(pipeline.predict_batch(rows)?)?,
        _ => serde_json::to_value(pipeline.predict(&input)?)?,
    };
    Ok(json!({ "ok": true, "prediction": prediction }))
}

/// Predict with the artifact at `artifact_path`. `input_json` is one record
/// object or an array of them. Always returns a JSON string: on failure
/// `{"ok":false,"code":N,"error":"..."}`.
#[no_mangle]
pub extern "C" fn cropcast_predict(
    artifact_path: *const c_char,
    input_json: *const c_char,
) -> *const c_char {
    let Some(input) = borrow_str(input_json) else {
        return string_to_raw(error_json(&CropError::invalid("null input")));
    };
    let cfg = load_cfg();
    match predict_from_file(&cfg, borrow_str(artifact_path), &input) {
        Ok(body) => string_to_raw(body.to_string()),
        Err(err) => {
            error!(ev = "ffi.predict_failed", code = err.code() as u32, error = %err);
            string_to_raw(error_json(&err))
        }
    }
}

/// Free strings allocated by Rust.
#[no_mangle]
pub extern "C" fn cropcast_free_str(ptr: *const c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        let _ = CString::from_raw(ptr as *mut c_char);
    }
}

fn error_json(err: &CropError) -> String {
    json!({ "ok": false, "code": err.code() as u32, "error": err.to_string() }).to_string()
}

fn string_to_raw(s: String) -> *const c_char {
    match CString::new(s) {
        Ok(cstring) => cstring.into_raw(),
        Err(_) => fallback_json_raw(),
    }
}

fn fallback_json_raw() -> *const c_char {
    // No interior NUL, so construction cannot fail; the empty string is a last resort.
    CString::new("{\"ok\":false}").unwrap_or_default().into_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(ptr: *const c_char) -> Value {
        let text = unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned();
        cropcast_free_str(ptr);
        serde_json::from_str(&text).unwrap()
    }

    #[test]
    fn version_is_one() {
        assert_eq!(cropcast_api_version(), 1);
    }

    #[test]
    fn null_input_reports_invalid() {
        let out = take(cropcast_predict(std::ptr::null(), std::ptr::null()));
        assert_eq!(out["ok"], false);
        assert_eq!(out["code"], ErrorCode::InvalidInput as u32);
    }

    #[test]
    fn missing_artifact_reports_io() {
        let path = CString::new("/nonexistent/cropcast.json").unwrap();
        let input = CString::new("{}").unwrap();
        let out = take(cropcast_predict(path.as_ptr(), input.as_ptr()));
        assert_eq!(out["code"], ErrorCode::Io as u32);
    }

    #[test]
    fn bad_config_is_rejected_before_io() {
        let root = CString::new("/nonexistent").unwrap();
        let cfg = CString::new("{\"cv_folds\": 0}").unwrap();
        let artifact = CString::new("/nonexistent/out.json").unwrap();
        let code = cropcast_train(root.as_ptr(), cfg.as_ptr(), artifact.as_ptr());
        assert_eq!(code, ErrorCode::InvalidInput as u32);
    }
}
