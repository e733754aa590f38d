/// reading whole CHEMKIN mechanism files: sections, element and species lists,
/// splicing a new reactions block back into the file
pub mod load_from_file;
/// logger initialisation for binaries
pub mod logging;
