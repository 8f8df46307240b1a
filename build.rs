// build.rs
fn main() {
    // Build info for snmp_build_info
    vergen::EmitBuilder::builder()
        .all_build()
        .all_git()
        .all_rustc()
        .emit()
        .expect("Unable to generate build info");
}
