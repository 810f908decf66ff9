use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl FileInfo {
    pub fn display_size(&self) -> String {
        format_file_size(self.size)
    }
}

/// Cheap pre-flight check: extension and header only. Never fails.
pub fn validate(path: &Path) -> bool {
    let has_pdf_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false);
    if !has_pdf_extension || !path.is_file() {
        return false;
    }

    let mut header = [0u8; 4];
    match File::open(path).and_then(|mut file| file.read_exact(&mut header)) {
        Ok(()) => &header == PDF_MAGIC,
        Err(_) => false,
    }
}

pub fn get_file_info(path: &Path) -> Result<FileInfo> {
    let metadata =
        fs::metadata(path).with_context(|| format!("failed to stat {:?}", path))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileInfo {
        name,
        path: path.to_path_buf(),
        size: metadata.len(),
        modified: metadata.modified().ok(),
    })
}

pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn validate_accepts_pdf_header_with_any_extension_case() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Report.PDF");
        fs::write(&path, b"%PDF-1.7\n%\xE2\xE3\xCF\xD3\n").unwrap();
        assert!(validate(&path));
    }

    #[test]
    fn validate_rejects_renamed_text_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.pdf");
        fs::write(&path, b"just some text").unwrap();
        assert!(!validate(&path));
    }

    #[test]
    fn validate_rejects_wrong_extension_missing_and_short_files() {
        let dir = tempdir().unwrap();
        let txt = dir.path().join("doc.txt");
        fs::write(&txt, b"%PDF-1.4").unwrap();
        assert!(!validate(&txt));

        assert!(!validate(&dir.path().join("missing.pdf")));

        let short = dir.path().join("short.pdf");
        fs::write(&short, b"%P").unwrap();
        assert!(!validate(&short));

        assert!(!validate(dir.path()));
    }

    #[test]
    fn file_info_reports_name_and_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("sample.pdf");
        fs::write(&path, vec![0u8; 3 * 1024 * 1024]).unwrap();

        let info = get_file_info(&path).unwrap();
        assert_eq!(info.name, "sample.pdf");
        assert_eq!(info.size, 3 * 1024 * 1024);
        assert_eq!(info.display_size(), "3.00 MB");
        assert!(info.modified.is_some());
    }

    #[test]
    fn file_info_fails_for_missing_path() {
        let dir = tempdir().unwrap();
        assert!(get_file_info(&dir.path().join("nope.pdf")).is_err());
    }

    #[test]
    fn file_sizes_use_binary_units() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.50 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024 * 1024), "5.00 GB");
    }
}
