use rustc_version::{version_meta, Channel};

// `rustc_nightly` gates the `#[bench]` harness in the unit test modules.
fn main() {
    let meta = version_meta().expect("could not query rustc version");
    if let Channel::Nightly = meta.channel {
        println!("cargo:rustc-cfg=rustc_nightly");
    }
}
