use std::env;
use std::path::PathBuf;

// The header lands in OUT_DIR; host build scripts copy it from there.
fn main() {
    println!("cargo:rerun-if-changed=src");

    let (Ok(crate_dir), Ok(out_dir)) = (env::var("CARGO_MANIFEST_DIR"), env::var("OUT_DIR")) else {
        println!("cargo:warning=header generation skipped: cargo environment not set");
        return;
    };
    let header = PathBuf::from(out_dir).join("estate.h");

    let config = cbindgen::Config {
        language: cbindgen::Language::C,
        include_guard: Some("ESTATE_FFI_H".to_string()),
        cpp_compat: true,
        ..Default::default()
    };

    match cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_config(config)
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        Err(e) => println!("cargo:warning=header generation skipped: {e}"),
    }
}
