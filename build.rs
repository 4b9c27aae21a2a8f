fn main() {
    // Only generate the C header when the ffi feature is enabled
    if std::env::var("CARGO_FEATURE_FFI").is_ok() {
        generate_header();
    }

    println!("cargo:rerun-if-changed=src/ffi/");
    println!("cargo:rerun-if-changed=cbindgen.toml");
}

fn generate_header() {
    let Ok(crate_dir) = std::env::var("CARGO_MANIFEST_DIR") else {
        eprintln!("Warning: CARGO_MANIFEST_DIR unset, skipping header generation");
        return;
    };
    let crate_dir = std::path::PathBuf::from(crate_dir);
    let output_file = crate_dir.join("include").join("fips_cipher.h");
    std::fs::create_dir_all(crate_dir.join("include")).ok();

    let mut config = match cbindgen::Config::from_file(crate_dir.join("cbindgen.toml")) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: cbindgen.toml unreadable ({e}), using defaults");
            cbindgen::Config::default()
        }
    };
    if config.sys_includes.is_empty() {
        config.sys_includes = vec![
            "stdint.h".to_string(),
            "stddef.h".to_string(),
            "stdbool.h".to_string(),
        ];
    }

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            let _ = bindings.write_to_file(&output_file);
        }
        Err(e) => {
            // Don't fail the build, just warn
            eprintln!("Warning: cbindgen failed: {e}");
        }
    }
}
