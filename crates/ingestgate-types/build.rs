fn main() {
    println!("cargo:rerun-if-changed=proto/remote_write.proto");
    prost_build::compile_protos(&["proto/remote_write.proto"], &["proto/"])
        .expect("failed to compile remote_write.proto");
}
