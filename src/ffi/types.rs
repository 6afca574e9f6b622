//! Core FFmpeg type definitions
//!
//! All FFmpeg structs are opaque (zero-sized) to avoid version-specific layout dependencies.
//! Field access is done via the thin C accessor library in accessors.c

use std::marker::PhantomData;
use std::os::raw::c_int;

// ============================================================================
// Rational Number
// ============================================================================

/// Rational number for time bases and frame rates
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AVRational {
  /// Numerator
  pub num: c_int,
  /// Denominator
  pub den: c_int,
}

impl AVRational {
  pub const fn new(num: c_int, den: c_int) -> Self {
    Self { num, den }
  }

  pub fn as_f64(&self) -> f64 {
    if self.den == 0 {
      0.0
    } else {
      self.num as f64 / self.den as f64
    }
  }

  /// A usable time base has a positive numerator and denominator
  pub fn is_valid(&self) -> bool {
    self.num > 0 && self.den > 0
  }

  /// Microsecond time base (1/1000000), FFmpeg's AV_TIME_BASE_Q
  pub const MICROSECONDS: Self = Self {
    num: 1,
    den: 1_000_000,
  };
}

impl std::fmt::Display for AVRational {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}/{}", self.num, self.den)
  }
}

// ============================================================================
// Pixel Formats
// ============================================================================

/// Pixel formats the crate names explicitly.
///
/// Decoders may produce any of FFmpeg's several hundred formats, so values read
/// back from FFmpeg stay raw `c_int` until matched with [`AVPixelFormat::from_raw`].
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AVPixelFormat {
  None = -1,
  // Planar YUV formats
  Yuv420p = 0,
  Yuv422p = 4,
  Yuv444p = 5,
  // Semi-planar formats
  Nv12 = 23,
  // Gray
  Gray8 = 8,
  // Packed RGB formats
  Rgb24 = 2,
  Bgr24 = 3,
  Argb = 25,
  Rgba = 26,
  Abgr = 27,
  Bgra = 28,
}

impl AVPixelFormat {
  /// Match a raw FFmpeg pixel format value against the named subset
  pub fn from_raw(raw: c_int) -> Option<Self> {
    match raw {
      -1 => Some(Self::None),
      0 => Some(Self::Yuv420p),
      2 => Some(Self::Rgb24),
      3 => Some(Self::Bgr24),
      4 => Some(Self::Yuv422p),
      5 => Some(Self::Yuv444p),
      8 => Some(Self::Gray8),
      23 => Some(Self::Nv12),
      25 => Some(Self::Argb),
      26 => Some(Self::Rgba),
      27 => Some(Self::Abgr),
      28 => Some(Self::Bgra),
      _ => None,
    }
  }

  /// Get the raw FFmpeg pixel format value
  pub fn as_raw(&self) -> c_int {
    *self as c_int
  }

  /// Bytes per pixel for packed formats, `None` for planar ones
  pub fn packed_bytes_per_pixel(&self) -> Option<usize> {
    match self {
      Self::Argb | Self::Rgba | Self::Abgr | Self::Bgra => Some(4),
      Self::Rgb24 | Self::Bgr24 => Some(3),
      Self::Gray8 => Some(1),
      _ => None,
    }
  }
}

// ============================================================================
// Opaque FFmpeg Types
// ============================================================================

/// Opaque AVCodec structure (codec implementation descriptor)
#[repr(C)]
pub struct AVCodec {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVCodecContext structure (encoder/decoder instance)
#[repr(C)]
pub struct AVCodecContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVFrame structure (uncompressed video/audio data)
#[repr(C)]
pub struct AVFrame {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVPacket structure (compressed data)
#[repr(C)]
pub struct AVPacket {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque SwsContext structure (software scaler context)
#[repr(C)]
pub struct SwsContext {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

/// Opaque AVDictionary structure (key-value options)
#[repr(C)]
pub struct AVDictionary {
  _opaque: [u8; 0],
  _marker: PhantomData<(*mut u8, std::marker::PhantomPinned)>,
}

// ============================================================================
// Constants
// ============================================================================

/// No timestamp value
pub const AV_NOPTS_VALUE: i64 = 0x8000000000000000u64 as i64;
