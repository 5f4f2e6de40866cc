use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
  fs::create_dir_all(path)
}

pub fn write_string(path: &Path, content: &str) -> std::io::Result<()> {
  if let Some(parent) = path.parent() {
    if !parent.as_os_str().is_empty() {
      ensure_dir(parent)?;
    }
  }
  fs::write(path, content)
}
