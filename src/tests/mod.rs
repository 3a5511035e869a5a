mod convert_tests;
mod utils;
