use std::path::Path;

/// Reads a text resource. Failures are logged and yield an empty string so a
/// missing shader degrades to a compile error instead of aborting.
pub(crate) fn read_text(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            log::error!("Failed to read {:?}: {}", path, err);
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty() {
        assert!(read_text(Path::new("no/such/shader.wgsl")).is_empty());
    }

    #[test]
    fn reads_existing_file() {
        let path = std::env::temp_dir().join("umbra_io_read_text.txt");
        std::fs::write(&path, "fn main() {}").expect("write temp file");
        assert_eq!(read_text(&path), "fn main() {}");
        let _ = std::fs::remove_file(&path);
    }
}
