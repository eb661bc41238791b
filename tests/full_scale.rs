use std::{
    fs, io,
    path::{Path, PathBuf},
};
use gcra_lib as gcra;

/// Options for one program. A `machine.json` next to the `valid/` and
/// `invalid/` directories replaces the built-in target.
fn get_options(path: &PathBuf) -> gcra::options::Options {
    let machine = path
        .parent()
        .and_then(Path::parent)
        .map(|stage| stage.join("machine.json"))
        .filter(|machine| machine.is_file())
        .map(|machine| machine.to_str().unwrap().to_string());
    gcra::options::Options {
        input: vec![path.to_str().unwrap().to_string()],
        output: None,
        machine,
        target: "avr".to_string(),
        allocation_settings: gcra::options::AllocationSettings {
            max_attempts: None,
            spill_unallocatable: false,
        },
        stats: true,
        verify: true,
        verbose: 0,
    }
}

fn is_json_file(path: &PathBuf) -> bool {
    matches!(path.extension().and_then(|s| s.to_str()), Some("json"))
}

fn allocate(path: &PathBuf) -> Result<String, gcra::error::Error> {
    let options = get_options(path);
    let machine = gcra::driver::load_machine(&options)?;
    let settings = gcra::backend::register_allocation::AllocSettings::from(&options.allocation_settings);
    gcra::driver::allocate_file(&machine, &options.input[0], &settings, &options)
}

fn test_directories(dir: &Path, failures: &mut Vec<String>) -> io::Result<i32> {
    let mut fail_count = 0;
    if dir.is_dir() {
        for directory in fs::read_dir(dir)? {
            let path = directory?.path();
            if path.is_dir() {
                fail_count += test_stage(path, failures)?;
            }
        }
    } else {
        panic!("Expected directory")
    }
    Ok(fail_count)
}

fn test_stage(dir: PathBuf, failures: &mut Vec<String>) -> io::Result<i32> {
    let fail_count = test_files(&dir.join("valid"), failures, test_valid)?
        + test_files(&dir.join("invalid"), failures, test_invalid)?;
    Ok(fail_count)
}

fn test_files<F>(dir: &Path, failures: &mut Vec<String>, test: F) -> io::Result<i32>
where
    F: Fn(PathBuf, &mut Vec<String>, &mut i32),
{
    let mut fail_count = 0;
    if !dir.is_dir() {
        return Ok(0);
    }
    let mut paths = Vec::new();
    for file in fs::read_dir(dir)? {
        paths.push(file?.path());
    }
    paths.sort();
    for path in paths.into_iter().filter(is_json_file) {
        eprintln!("Testing {}", path.to_str().unwrap());
        test(path, failures, &mut fail_count);
    }
    Ok(fail_count)
}

fn test_valid(path: PathBuf, failures: &mut Vec<String>, fail_count: &mut i32) {
    match allocate(&path) {
        Ok(listing) => {
            if !listing.starts_with(&format!("; {}\n", path.to_str().unwrap())) {
                failures.push(format!("{}: malformed listing", path.to_str().unwrap()));
                *fail_count += 1;
            }
        }
        Err(error) => {
            failures.push(format!("{}: {}", path.to_str().unwrap(), error));
            *fail_count += 1;
        }
    }
}

fn test_invalid(path: PathBuf, failures: &mut Vec<String>, fail_count: &mut i32) {
    if allocate(&path).is_ok() {
        failures.push(format!("{}: expected an error", path.to_str().unwrap()));
        *fail_count += 1;
    }
}

#[test]
fn full_scale() {
    let mut failures = Vec::new();
    let fail_count = test_directories(Path::new("tests/programs"), &mut failures).unwrap();
    for failure in &failures {
        eprintln!("{}", failure);
    }
    assert_eq!(fail_count, 0);
}
