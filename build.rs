fn main() {
    println!("cargo:rerun-if-env-changed=DISKPLAN_VERSION");
}
