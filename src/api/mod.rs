//! External API surfaces (C ABI).

pub mod ffi;
