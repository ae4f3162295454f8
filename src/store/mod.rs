pub mod session_file;
pub mod tsv;
