fn main() {
    if let Err(err) = csv_rowcodec::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
