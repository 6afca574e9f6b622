//! Conversion of crate errors into JavaScript errors
//!
//! Caller mistakes (bad geometry, short pixel buffers) surface as
//! `InvalidArg`; everything else as `GenericFailure`. The message always
//! starts with the error kind so scripts can tell failures apart.

use crate::codec::CodecError;
use napi::bindgen_prelude::*;

/// Status a [`CodecError`] maps to at the host boundary
pub fn status_of(err: &CodecError) -> Status {
  if err.is_caller_error() {
    Status::InvalidArg
  } else {
    Status::GenericFailure
  }
}

impl From<CodecError> for Error {
  fn from(err: CodecError) -> Self {
    Error::new(status_of(&err), format!("{}: {}", err.kind(), err))
  }
}

/// Error returned when the wrapped session lock was poisoned by a panic
pub(crate) fn lock_poisoned() -> Error {
  Error::new(Status::GenericFailure, "Lock poisoned")
}
