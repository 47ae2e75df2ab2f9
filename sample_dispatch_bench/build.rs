use std::env;

// Records the optimization level of the build so it can be reported next to every measurement.
fn main() {
    let opt_level = env::var("OPT_LEVEL").unwrap_or_else(|_| "unknown".to_owned());
    println!("cargo:rustc-env=SAMPLE_DISPATCH_OPT_LEVEL={opt_level}");
    println!("cargo:rerun-if-env-changed=OPT_LEVEL");
}
