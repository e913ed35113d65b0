//! File-system and network helpers that report through the logging facade.

pub mod checks;
pub mod copy;
pub mod download;
pub mod files;
pub mod paths;

pub use checks::{
    create_if_directory_does_not_exist, fail_if_file_does_not_exist, random_string,
    verify_present, warn_if_file_exists,
};
pub use copy::{CopyOptions, copy_directory};
pub use download::{DownloadProgress, Downloader, download_file};
pub use files::{DeletePolicy, PATH_NOT_FOUND, delete_files, get_files};
pub use paths::{get_relative_path, view_file_path};
