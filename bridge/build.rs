fn main() {
    println!("cargo:rerun-if-env-changed=CODEC_BRIDGE_LIB_DIR");
    if let Ok(dir) = std::env::var("CODEC_BRIDGE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    if std::env::var("CARGO_CFG_TARGET_OS").as_deref() == Ok("macos") {
        println!("cargo:rustc-link-search=native=/opt/homebrew/lib");
    }

    // Link only the libraries whose bindings are compiled in.
    if std::env::var_os("CARGO_FEATURE_G722").is_some() {
        println!("cargo:rustc-link-lib=spandsp");
    }
    if std::env::var_os("CARGO_FEATURE_OPUS").is_some() {
        println!("cargo:rustc-link-lib=opus");
    }
    if std::env::var_os("CARGO_FEATURE_SPEEX").is_some() {
        println!("cargo:rustc-link-lib=speex");
        println!("cargo:rustc-link-lib=speexdsp");
    }
}
