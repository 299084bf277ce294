pub mod directory;
pub mod file_lock;
pub mod fs_directory;
pub mod layout;
pub mod manifest;
pub mod ram_directory;
pub mod segment;
pub mod segment_reader;
pub mod segment_writer;
