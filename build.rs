//! Build script for video-codec
//!
//! Handles:
//! 1. NAPI-RS setup
//! 2. Compiling the C accessor library via `cc`
//! 3. Linking the FFmpeg libraries (static when archives exist, dynamic otherwise)

use std::env;
use std::path::{Path, PathBuf};

/// FFmpeg libraries in link order (dependents first)
const FFMPEG_LIBS: [&str; 4] = ["avformat", "avcodec", "swscale", "avutil"];

fn main() {
  // NAPI-RS build setup
  napi_build::setup();

  let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

  let ffmpeg_dir = get_ffmpeg_dir(&target_os, &target_arch);

  compile_accessors(&ffmpeg_dir);

  link_ffmpeg(&ffmpeg_dir, &target_os);

  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");
}

/// Get FFmpeg installation directory
fn get_ffmpeg_dir(target_os: &str, target_arch: &str) -> PathBuf {
  if let Ok(dir) = env::var("FFMPEG_DIR") {
    return PathBuf::from(dir);
  }

  #[cfg(unix)]
  {
    if let Ok(output) = std::process::Command::new("pkg-config")
      .args(["--variable=prefix", "libavformat"])
      .output()
    {
      if output.status.success() {
        let prefix = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(prefix.trim());
        if path.exists() {
          return path;
        }
      }
    }
  }

  let common_paths = match target_os {
    "macos" => vec!["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => vec!["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => vec!["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => vec![],
  };

  for path in common_paths {
    let p = PathBuf::from(path);
    if p.join("include/libavformat/avformat.h").exists() {
      return p;
    }
  }

  // Bundled FFmpeg in project directory
  let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_default());
  let platform = match (target_os, target_arch) {
    ("macos", "aarch64") => "darwin-arm64",
    ("macos", "x86_64") => "darwin-x64",
    ("linux", "x86_64") => "linux-x64",
    ("linux", "aarch64") => "linux-arm64",
    ("windows", "x86_64") => "win32-x64",
    _ => "unknown",
  };

  let bundled = manifest_dir.join("ffmpeg").join(platform);
  if bundled.exists() {
    return bundled;
  }

  println!(
    "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
  );
  PathBuf::from("/usr/local")
}

/// Compile the C accessor library
fn compile_accessors(ffmpeg_dir: &Path) {
  let include_dir = ffmpeg_dir.join("include");

  let mut build = cc::Build::new();
  build
    .file("src/ffi/accessors.c")
    .include(&include_dir)
    .warnings(true)
    .extra_warnings(true);

  // Distro packages on Debian/Ubuntu keep headers under a multiarch dir
  for multiarch in ["include/x86_64-linux-gnu", "include/aarch64-linux-gnu"] {
    let dir = ffmpeg_dir.join(multiarch);
    if dir.join("libavformat").exists() {
      build.include(dir);
    }
  }

  #[cfg(target_os = "macos")]
  {
    build.flag("-Wno-deprecated-declarations");
  }

  build.compile("ffmpeg_accessors");
}

/// Link FFmpeg libraries
///
/// Static archives are preferred so the addon ships self-contained. When any of
/// them is missing the whole set is linked dynamically instead; mixing the two
/// would pull duplicate copies of libavutil into the binary.
fn link_ffmpeg(ffmpeg_dir: &Path, target_os: &str) {
  let lib_dirs = get_library_paths(ffmpeg_dir, target_os);

  let static_libs: Vec<PathBuf> = FFMPEG_LIBS
    .iter()
    .filter_map(|lib| find_static_lib_path(lib, &lib_dirs))
    .collect();

  if static_libs.len() == FFMPEG_LIBS.len() {
    for path in &static_libs {
      println!("cargo:rustc-link-arg={}", path.display());
    }
    link_static_codec_libraries(&lib_dirs);
    link_platform_libraries(target_os);
  } else {
    for dir in &lib_dirs {
      if dir.exists() {
        println!("cargo:rustc-link-search=native={}", dir.display());
      }
    }
    for lib in FFMPEG_LIBS {
      println!("cargo:rustc-link-lib=dylib={}", lib);
    }
  }
}

/// External codec libraries a static FFmpeg build may depend on
fn link_static_codec_libraries(lib_dirs: &[PathBuf]) {
  let codec_libs = [
    "x264", "x265", "vpx", "aom", "dav1d", "xvidcore", "theora", "ogg", "zimg",
  ];

  let mut linked_x265 = false;
  for lib in codec_libs {
    if let Some(path) = find_static_lib_path(lib, lib_dirs) {
      println!("cargo:rustc-link-arg={}", path.display());
      linked_x265 |= lib == "x265";
    }
  }

  // x265 requires C++ runtime
  if linked_x265 {
    match env::var("CARGO_CFG_TARGET_OS").unwrap_or_default().as_str() {
      "macos" => println!("cargo:rustc-link-lib=c++"),
      "linux" => println!("cargo:rustc-link-lib=stdc++"),
      _ => {}
    }
  }
}

/// Get library search paths
fn get_library_paths(ffmpeg_dir: &Path, target_os: &str) -> Vec<PathBuf> {
  let mut paths = vec![ffmpeg_dir.join("lib")];

  if let Ok(lib_path) = env::var("LIBRARY_PATH") {
    for path in lib_path.split(':') {
      paths.push(PathBuf::from(path));
    }
  }

  match target_os {
    "macos" => {
      paths.push(PathBuf::from("/opt/homebrew/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/opt/local/lib"));
    }
    "linux" => {
      paths.push(ffmpeg_dir.join("lib/x86_64-linux-gnu"));
      paths.push(ffmpeg_dir.join("lib/aarch64-linux-gnu"));
      paths.push(PathBuf::from("/usr/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/usr/lib/x86_64-linux-gnu"));
      paths.push(PathBuf::from("/usr/lib/aarch64-linux-gnu"));
    }
    _ => {}
  }

  if let Ok(brew_prefix) = env::var("HOMEBREW_PREFIX") {
    paths.push(PathBuf::from(brew_prefix).join("lib"));
  }

  paths
}

/// Find static library path if it exists
fn find_static_lib_path(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
  let static_name = format!("lib{}.a", name);
  paths
    .iter()
    .map(|path| path.join(&static_name))
    .find(|full_path| full_path.exists())
}

/// Link platform-specific system libraries (static FFmpeg only)
fn link_platform_libraries(target_os: &str) {
  match target_os {
    "macos" => {
      for framework in ["CoreFoundation", "CoreMedia", "CoreVideo", "VideoToolbox", "Security"] {
        println!("cargo:rustc-link-lib=framework={}", framework);
      }
      println!("cargo:rustc-link-lib=bz2");
      println!("cargo:rustc-link-lib=iconv");
      println!("cargo:rustc-link-lib=lzma");
    }
    "linux" => {
      println!("cargo:rustc-link-lib=m");
      println!("cargo:rustc-link-lib=pthread");
      println!("cargo:rustc-link-lib=dl");
    }
    "windows" => {
      for lib in ["bcrypt", "ole32", "user32", "ws2_32", "secur32"] {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }
    _ => {
      println!("cargo:warning=Unknown target OS: {}", target_os);
    }
  }
}
