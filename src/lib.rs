#[allow(non_snake_case)]
pub mod Chemkin;
#[allow(non_snake_case)]
pub mod Examples;
#[allow(non_snake_case)]
pub mod Utils;
pub mod settings;
