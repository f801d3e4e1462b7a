fn main() {
    if let Err(err) = splice_router::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
