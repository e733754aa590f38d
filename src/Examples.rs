/// runnable walkthroughs of parsing, writing and editing CHEMKIN reaction blocks
pub mod chemkin_examples;
