//! Build script for efb-cef.
//!
//! The CEF shim is loaded at runtime, so this only forwards a default
//! search location for it when one is known at build time.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=EFB_CEF_SHIM_PATH");
    println!("cargo:rerun-if-env-changed=CEF_PATH");

    let shim_dir = env::var("EFB_CEF_SHIM_PATH")
        .or_else(|_| env::var("CEF_PATH").map(|p| format!("{p}/Release")))
        .ok()
        .map(PathBuf::from);

    if let Some(ref path) = shim_dir {
        // Baked in as a fallback; the runtime env var still wins
        println!("cargo:rustc-env=EFB_CEF_SHIM_DEFAULT_DIR={}", path.display());
    }
}
