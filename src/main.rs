#[allow(non_snake_case)]
pub mod Chemkin;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Utils;
pub mod settings;

use Examples::chemkin_examples::chemkin_examples;
use Utils::logging::init_logger;
use log::LevelFilter;

pub fn main() {
    //
    if let Err(e) = init_logger(LevelFilter::Info, None) {
        eprintln!("{}", e);
    }
    let task: usize = 1;
    chemkin_examples(task);
}
