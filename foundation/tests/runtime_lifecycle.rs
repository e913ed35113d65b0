//! End-to-end: initialize with file logging, run the file utilities through
//! the runtime's logger, and check what reached the log file.

use std::fs;
use std::path::Path;

use foundation::io::{
    CopyOptions, DeletePolicy, PATH_NOT_FOUND, copy_directory, delete_files, get_files,
    get_relative_path,
};
use foundation::test_support::write_file;
use foundation::{InitOutcome, Runtime};

#[test]
fn file_utilities_report_through_initialized_logger() {
    let temp = tempfile::tempdir().expect("tempdir");
    let work = temp.path().join("work");
    let logs = temp.path().join("logs");
    write_file(&work, "contracts/Token.sol", "contract Token {}");
    write_file(&work, "contracts/Vault.sol", "contract Vault {}");
    write_file(&work, "contracts/README.md", "docs");

    let runtime = Runtime::new();
    let outcome = runtime
        .initialize_with_file_logging("foundation", "lifecycle", true, Some(&logs))
        .expect("initialize");
    assert_eq!(outcome, InitOutcome::Initialized);
    let log = runtime.logger();

    let sources = get_files(log, "*.sol", &work.join("contracts"), false);
    assert_eq!(sources.len(), 2);

    let copied = copy_directory(
        log,
        &work.join("contracts"),
        &work.join("build"),
        CopyOptions {
            recursive: true,
            overwrite: false,
        },
    )
    .expect("copy");
    assert_eq!(copied, 3);

    let deleted = delete_files(
        log,
        "*.sol",
        &work.join("build"),
        true,
        DeletePolicy::AbortOnFirstError,
    )
    .expect("delete");
    assert_eq!(deleted, 2);
    assert!(get_files(log, "*.sol", &work.join("build"), true).is_empty());

    let missing = delete_files(
        log,
        "*.sol",
        &work.join("nowhere"),
        true,
        DeletePolicy::AbortOnFirstError,
    )
    .expect("delete missing");
    assert_eq!(missing, PATH_NOT_FOUND);

    let relative = get_relative_path(
        &work.to_string_lossy(),
        &work.join("build").join("README.md").to_string_lossy(),
    );
    assert!(work.join(&relative).is_file());

    let contents =
        fs::read_to_string(logs.join("foundation-lifecycle.log")).expect("read log file");
    assert!(contents.contains("Copying"));
    assert!(contents.contains("completed in"));
    assert!(contents.contains("does not exist"));
    assert!(contents.contains(&Path::new("nowhere").display().to_string()));
}

#[test]
fn later_initialize_variants_do_not_touch_the_filesystem() {
    let temp = tempfile::tempdir().expect("tempdir");
    let runtime = Runtime::new();
    runtime
        .initialize_silent("foundation", "silent", false)
        .expect("initialize");

    let outcome = runtime
        .initialize_with_file_and_console_logging("foundation", "late", false, Some(temp.path()))
        .expect("second initialize");

    assert_eq!(outcome, InitOutcome::AlreadyInitialized);
    assert!(!temp.path().join("foundation-late.log").exists());
}
