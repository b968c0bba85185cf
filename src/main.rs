fn main() {
    if let Err(err) = quirkvis::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
