fn main() {
    if let Err(err) = questmap::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
