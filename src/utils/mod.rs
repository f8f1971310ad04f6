pub mod archive;
pub mod fs_ops;
pub mod process;
pub mod prompt;
pub mod template;
pub mod version;
