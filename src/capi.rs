//! Minimal C ABI: parameter validation and an opaque exact-scheme context.
//!
//! Names follow the C header conventions of the callers this surface serves,
//! hence the lowercase types and upper-case variants.

#![allow(non_camel_case_types)]

use std::ptr;

use tracing::debug;

use crate::bfv::BfvBackend;
use crate::error::HealError;
use crate::params::{BfvOptions, Security};

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum heal_err {
    HEAL_OK,
    HEAL_OUT_OF_MEMORY,
    HEAL_INVALID_PARAMETERS,
    HEAL_IV_CONTEXT_INVALID,
    HEAL_IV_BACKEND_INVALID,
    HEAL_IV_SECURITY_INVALID,
    HEAL_IV_P_MODULUS_MUST_BE_1_MOD_2_TIMES_DEGREE,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum heal_iv_backend {
    HEAL_IV_BACKEND_NONE,
    HEAL_IV_BACKEND_BFV,
}

/// Room for a chain of about 60·32 = 1920 bits.
pub const HEAL_IV_MAX_RNS_BASIS_SIZE: usize = 32;

/// `security` is the classical bit level (128, 192 or 256); `p_modulus == 0`
/// derives the plain modulus from the degree.
///
/// The chain is always derived from `security`, so every `q_modulus` entry
/// must be zero.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct heal_iv_params {
    pub backend: heal_iv_backend,
    pub degree: usize,
    pub security: usize,
    pub p_modulus: i64,
    pub q_modulus: [i64; HEAL_IV_MAX_RNS_BASIS_SIZE],
}

/// Opaque handle owning a backend and its keys.
pub struct heal_iv_context_ {
    backend: BfvBackend,
}

pub type heal_iv_context = *mut heal_iv_context_;

impl From<&HealError> for heal_err {
    fn from(err: &HealError) -> Self {
        match err {
            HealError::PlainModulusNotBatching { .. } => heal_err::HEAL_IV_P_MODULUS_MUST_BE_1_MOD_2_TIMES_DEGREE,
            HealError::SecurityUnsatisfiable { .. } => heal_err::HEAL_IV_SECURITY_INVALID,
            _ => heal_err::HEAL_INVALID_PARAMETERS,
        }
    }
}

fn options_from(params: &heal_iv_params) -> Result<BfvOptions, heal_err> {
    if params.backend != heal_iv_backend::HEAL_IV_BACKEND_BFV {
        return Err(heal_err::HEAL_IV_BACKEND_INVALID);
    }
    let security = match params.security {
        128 => Security::Classic128,
        192 => Security::Classic192,
        256 => Security::Classic256,
        _ => return Err(heal_err::HEAL_IV_SECURITY_INVALID),
    };
    if params.q_modulus.iter().any(|&q| q != 0) {
        return Err(heal_err::HEAL_INVALID_PARAMETERS);
    }
    let p = u64::try_from(params.p_modulus).map_err(|_| heal_err::HEAL_INVALID_PARAMETERS)?;
    let options = BfvOptions::new(params.degree).security(security).plain_modulus(p);
    options.resolve().map_err(|e| heal_err::from(&e))?;
    Ok(options)
}

#[no_mangle]
pub extern "C" fn heal_iv_params_validate(params: heal_iv_params) -> heal_err {
    match options_from(&params) {
        Ok(_) => heal_err::HEAL_OK,
        Err(code) => code,
    }
}

/// Build a context into `*ctx`. On failure `*ctx` is left null.
///
/// # Safety
///
/// `ctx` must be null or valid for writes.
#[no_mangle]
pub unsafe extern "C" fn heal_iv_context_init_(ctx: *mut heal_iv_context, params: heal_iv_params) -> heal_err {
    if ctx.is_null() {
        return heal_err::HEAL_IV_CONTEXT_INVALID;
    }
    // SAFETY: non-null and valid for writes per the contract above.
    unsafe { *ctx = ptr::null_mut() };
    let options = match options_from(&params) {
        Ok(options) => options,
        Err(code) => return code,
    };
    match BfvBackend::create(options) {
        Ok(backend) => {
            debug!(degree = params.degree, "c context created");
            // SAFETY: as above.
            unsafe { *ctx = Box::into_raw(Box::new(heal_iv_context_ { backend })) };
            heal_err::HEAL_OK
        }
        Err(err) => heal_err::from(&err),
    }
}

/// Release a context created by [`heal_iv_context_init_`] and null the handle.
///
/// # Safety
///
/// `ctx` must be null or point to a handle that is null or came from
/// [`heal_iv_context_init_`] and has not been released.
#[no_mangle]
pub unsafe extern "C" fn heal_iv_context_fini(ctx: *mut heal_iv_context) -> heal_err {
    if ctx.is_null() {
        return heal_err::HEAL_OK;
    }
    // SAFETY: per the contract, `*ctx` is null or an unreleased box.
    unsafe {
        let handle = *ctx;
        if !handle.is_null() {
            drop(Box::from_raw(handle));
            *ctx = ptr::null_mut();
        }
    }
    heal_err::HEAL_OK
}

impl heal_iv_context_ {
    pub fn backend(&self) -> &BfvBackend {
        &self.backend
    }
}
