use gcra_lib as gcra;

fn main() {
    let options = gcra::options::get();
    gcra::logger::init(gcra::logger::level(options.verbose)).expect("Logger initialization failed");
    log::info!("hello logger");

    if let Err(()) = gcra::driver::drive(options) {
        std::process::exit(1);
    }
}
