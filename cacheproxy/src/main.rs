use cacheproxy::Paths;

fn main() {
    let paths = Paths::default();
    if let Err(err) = cacheproxy::run(&paths) {
        // the log sink may not have been installed yet (e.g. the log file
        // itself failed to open), so a startup failure always goes to
        // stderr; log::error! additionally reaches the file once the sink
        // is up, which covers failures later in the same startup sequence.
        eprintln!("cacheproxy: fatal: {err:#}");
        log::error!(target: "fatal", "{err:#}");
        std::process::exit(1);
    }
}
