fn main() {
    if let Err(err) = classroom_monitor_lib::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
