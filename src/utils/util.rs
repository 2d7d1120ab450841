use std::path::Path;

pub type Result<T> = std::result::Result<T, String>;

pub fn handle_error_and_exit(err: String) -> ! {
    log::error!("{}", err);
    std::process::exit(1);
}

/// Sample name implied by a file name: everything before the first `.`
pub fn sample_from_path(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Invalid file name: {}", path.display()))?;
    let sample = file_name.split('.').next().unwrap_or_default();
    if sample.is_empty() {
        return Err(format!(
            "Cannot derive a sample name from file name: {}",
            path.display()
        ));
    }
    Ok(sample.to_string())
}

pub fn create_writer<T, F>(output_prefix: &str, output_suffix: &str, f: F) -> Result<T>
where
    F: FnOnce(&Path) -> Result<T>,
{
    let output_path = format!("{}.{}", output_prefix, output_suffix);
    f(Path::new(&output_path))
}
