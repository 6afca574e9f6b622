//! Rust declarations for C accessor functions
//!
//! These functions provide access to FFmpeg struct fields via the thin C accessor library.

use super::avformat::{AVCodecParameters, AVFormatContext, AVIOContext, AVStream};
use super::types::*;
use std::os::raw::{c_char, c_int, c_uint, c_void};

/// Callback receiving one formatted FFmpeg log line
pub type LogSinkFn = unsafe extern "C" fn(level: c_int, line: *const c_char);

unsafe extern "C" {
  // ========================================================================
  // AVFormatContext
  // ========================================================================

  pub fn fffmt_set_pb(ctx: *mut AVFormatContext, pb: *mut AVIOContext);
  pub fn fffmt_add_flags(ctx: *mut AVFormatContext, flags: c_int);
  pub fn fffmt_get_duration(ctx: *const AVFormatContext) -> i64;
  pub fn fffmt_get_nb_streams(ctx: *const AVFormatContext) -> c_uint;
  pub fn fffmt_get_stream(ctx: *const AVFormatContext, index: c_uint) -> *mut AVStream;

  // ========================================================================
  // AVStream
  // ========================================================================

  pub fn ffstream_get_index(st: *const AVStream) -> c_int;
  pub fn ffstream_get_time_base(st: *const AVStream, num: *mut c_int, den: *mut c_int);
  pub fn ffstream_get_duration(st: *const AVStream) -> i64;
  pub fn ffstream_get_codecpar_const(st: *const AVStream) -> *const AVCodecParameters;

  // ========================================================================
  // AVCodecParameters
  // ========================================================================

  pub fn ffcodecpar_get_codec_type(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_codec_id(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_width(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_height(par: *const AVCodecParameters) -> c_int;
  pub fn ffcodecpar_get_format(par: *const AVCodecParameters) -> c_int;

  // ========================================================================
  // AVCodecContext
  // ========================================================================

  pub fn ffctx_get_thread_count(ctx: *const AVCodecContext) -> c_int;
  pub fn ffctx_set_thread_count(ctx: *mut AVCodecContext, thread_count: c_int);
  pub fn ffctx_set_pkt_timebase(ctx: *mut AVCodecContext, num: c_int, den: c_int);

  // ========================================================================
  // AVFrame
  // ========================================================================

  pub fn ffframe_get_width(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_height(frame: *const AVFrame) -> c_int;
  pub fn ffframe_get_format(frame: *const AVFrame) -> c_int;
  pub fn ffframe_set_width(frame: *mut AVFrame, width: c_int);
  pub fn ffframe_set_height(frame: *mut AVFrame, height: c_int);
  pub fn ffframe_set_format(frame: *mut AVFrame, format: c_int);
  pub fn ffframe_get_pts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_pkt_dts(frame: *const AVFrame) -> i64;
  pub fn ffframe_get_best_effort_timestamp(frame: *const AVFrame) -> i64;

  pub fn ffframe_data(frame: *mut AVFrame, plane: c_int) -> *mut u8;
  pub fn ffframe_data_const(frame: *const AVFrame, plane: c_int) -> *const u8;
  pub fn ffframe_linesize(frame: *const AVFrame, plane: c_int) -> c_int;

  // ========================================================================
  // AVPacket
  // ========================================================================

  pub fn ffpkt_data(pkt: *const AVPacket) -> *const u8;
  pub fn ffpkt_size(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_stream_index(pkt: *const AVPacket) -> c_int;
  pub fn ffpkt_pts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_dts(pkt: *const AVPacket) -> i64;
  pub fn ffpkt_advance(pkt: *mut AVPacket, consumed: c_int);

  // ========================================================================
  // AVIOContext
  // ========================================================================

  pub fn fffio_get_opaque(ctx: *const AVIOContext) -> *mut c_void;
  pub fn fffio_get_buffer(ctx: *const AVIOContext) -> *mut u8;

  // ========================================================================
  // Logging
  // ========================================================================

  /// Route av_log output to `sink` (NULL restores the default stderr logger)
  pub fn ff_install_log_sink(sink: Option<LogSinkFn>);
}
