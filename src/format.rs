//! File name helpers: supported formats, natural ordering, sanitizing

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

/// Image extensions accepted at add-time (lowercase, without the dot)
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif"];

/// Characters that are not allowed in file names on at least one platform
const ILLEGAL_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Check whether a path has one of the supported image extensions
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

/// One run of a natural sort key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeyPart {
    Number(u128),
    Text(String),
}

/// Build a sort key so that "page2" sorts before "page10"
///
/// Digit runs compare numerically, everything else compares lowercased.
pub fn natural_sort_key(name: &str) -> Vec<KeyPart> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_digits = false;

    for ch in name.chars() {
        let is_digit = ch.is_ascii_digit();
        if !current.is_empty() && is_digit != in_digits {
            parts.push(finish_part(&current, in_digits));
            current.clear();
        }
        in_digits = is_digit;
        current.push(ch);
    }
    if !current.is_empty() {
        parts.push(finish_part(&current, in_digits));
    }

    parts
}

fn finish_part(run: &str, digits: bool) -> KeyPart {
    if digits {
        // saturate on absurdly long digit runs
        KeyPart::Number(run.parse().unwrap_or(u128::MAX))
    } else {
        KeyPart::Text(run.to_lowercase())
    }
}

/// Compare two paths by the natural key of their file names
pub fn natural_cmp(a: &Path, b: &Path) -> Ordering {
    natural_sort_key(&file_name_of(a)).cmp(&natural_sort_key(&file_name_of(b)))
}

/// Sort paths in place by file name, numbers compared numerically
pub fn sort_naturally(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| natural_cmp(a, b));
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Replace characters that are illegal in file names with '_'
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if ILLEGAL_FILENAME_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Human readable file size ("512 B", "1.5 KB", "2.0 MB")
pub fn format_file_size(size_bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;

    if size_bytes < KIB {
        format!("{} B", size_bytes)
    } else if size_bytes < MIB {
        format!("{:.1} KB", size_bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", size_bytes as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file(Path::new("a/page01.jpg")));
        assert!(is_image_file(Path::new("COVER.PNG")));
        assert!(is_image_file(Path::new("strip.WebP")));
        assert!(is_image_file(Path::new("old.bmp")));
        assert!(!is_image_file(Path::new("notes.txt")));
        assert!(!is_image_file(Path::new("scan.tiff")));
        assert!(!is_image_file(Path::new("no_extension")));
    }

    #[test]
    fn test_natural_sort_numbers() {
        let mut paths = vec![
            PathBuf::from("p10.png"),
            PathBuf::from("p2.png"),
            PathBuf::from("P1.png"),
        ];
        sort_naturally(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("P1.png"),
                PathBuf::from("p2.png"),
                PathBuf::from("p10.png"),
            ]
        );
    }

    #[test]
    fn test_natural_sort_uses_file_name_only() {
        let mut paths = vec![PathBuf::from("z/ch1_3.jpg"), PathBuf::from("a/ch1_20.jpg")];
        sort_naturally(&mut paths);
        assert_eq!(paths[0], PathBuf::from("z/ch1_3.jpg"));
    }

    #[test]
    fn test_natural_key_long_digit_run() {
        let key = natural_sort_key("999999999999999999999999999999999999999999");
        assert_eq!(key, vec![KeyPart::Number(u128::MAX)]);
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("Vol 1: Part <A>?"), "Vol 1_ Part _A__");
        assert_eq!(sanitize_filename("a/b\\c|d*e\"f"), "a_b_c_d_e_f");
        assert_eq!(sanitize_filename("plain"), "plain");
    }

    #[test]
    fn test_format_file_size() {
        assert_eq!(format_file_size(512), "512 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(2 * 1024 * 1024), "2.0 MB");
    }
}
