fn main() {
    // Linking is opt-in; without the feature the crate compiles as a
    // stub and the workspace builds on machines without the library.
    if std::env::var_os("CARGO_FEATURE_LINK_CRONET").is_none() {
        return;
    }

    // CRONET_DIR points at the directory holding libcronet; falls back to
    // the system linker search path when unset.
    println!("cargo:rerun-if-env-changed=CRONET_DIR");
    if let Ok(dir) = std::env::var("CRONET_DIR") {
        println!("cargo:rustc-link-search=native={dir}");
    }
    println!("cargo:rustc-link-lib=dylib=cronet");
}
