use std::env;
use std::path::PathBuf;

// ffmpeg-next links against system FFmpeg. On Windows that usually comes
// from vcpkg, which the FFmpeg bindings only find through FFMPEG_DIR.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }
    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!(
            "cargo:warning=lottieframe needs FFmpeg; set FFMPEG_DIR (or VCPKG_ROOT with FFmpeg installed through vcpkg)."
        );
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.join("include").join("libavcodec").exists() {
        println!(
            "cargo:warning=Found FFmpeg under {}; set FFMPEG_DIR to that path if linking fails.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=No FFmpeg headers under {}; install with `vcpkg install ffmpeg`.",
            candidate.display()
        );
    }
}
