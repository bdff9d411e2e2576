//! Binary file classification.
//!
//! Two stages: a fast extension table lookup, then magic-byte sniffing of
//! the file head for everything the table does not settle.

use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes read from the head of a file for sniffing.
const SNIFF_LEN: usize = 1024;

/// Returned when nothing else applies.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Extensions that are always treated as binary, whatever their content.
pub const BINARY_EXTENSIONS: &[&str] = &[
    // Images
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "tif", "ico", "webp", "svg",
    // Audio
    "mp3", "wav", "flac", "aac", "ogg", "wma", "m4a", "opus",
    // Video
    "mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "mpg", "mpeg", "m4v", "3gp",
    // Documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "odt", "ods", "odp", "pages", "numbers",
    "key",
    // Archives
    "zip", "rar", "tar", "gz", "7z", "bz2", "xz",
    // Executables and libraries
    "exe", "dll", "so", "dylib", "bin", "apk", "app", "msi", "bat", "com",
    // Disk images
    "dmg", "iso", "img",
    // Design files
    "psd", "ai", "indd", "sketch",
    // Fonts
    "ttf", "otf", "woff", "woff2", "eot",
    // Bytecode and bundles
    "pyc", "class", "jar", "war", "ear",
    // Databases
    "db", "sqlite", "mdb", "accdb",
    // System files
    "sys", "drv", "cab",
    // Packages and opaque data
    "dat", "pkg", "deb", "rpm",
];

/// MIME types (or MIME prefixes ending in `/`) that are text even when the
/// generic `application/*` rule would say otherwise.
pub const TEXT_MIME_TYPES: &[&str] = &[
    "text/",
    "application/json",
    "application/javascript",
    "application/xml",
    "application/xhtml+xml",
];

/// Magic-byte signatures, checked in order; the first match wins.
const FILE_SIGNATURES: &[(&str, &[&[u8]])] = &[
    ("application/pdf", &[b"%PDF"]),
    ("image/jpeg", &[&[0xff, 0xd8, 0xff]]),
    ("image/png", &[&[0x89, 0x50, 0x4e, 0x47]]),
    ("image/gif", &[b"GIF8"]),
    ("image/webp", &[b"RIFF", b"WEBP"]),
    ("image/svg+xml", &[b"<svg"]),
    ("application/zip", &[&[0x50, 0x4b, 0x03, 0x04]]),
    ("application/x-7z-compressed", &[&[0x37, 0x7a, 0xbc, 0xaf, 0x27, 0x1c]]),
    ("application/x-tar", &[b"ustar"]),
    ("application/x-rar-compressed", &[&[0x52, 0x61, 0x72, 0x21, 0x1a, 0x07]]),
    ("application/gzip", &[&[0x1f, 0x8b, 0x08]]),
    ("application/x-bzip2", &[b"BZh"]),
    ("application/x-executable", &[&[0x7f, 0x45, 0x4c, 0x46]]),
    ("application/vnd.microsoft.portable-executable", &[b"MZ"]),
    ("application/x-shockwave-flash", &[b"CWS"]),
    ("audio/mpeg", &[b"ID3", &[0xff, 0xfb]]),
    ("audio/aac", &[&[0xff, 0xf1], &[0xff, 0xf9]]),
    ("audio/ogg", &[b"OggS"]),
    ("video/mp4", &[&[0x00, 0x00, 0x00], b"ftypisom"]),
    ("video/x-matroska", &[&[0x1a, 0x45, 0xdf, 0xa3]]),
    ("application/msword", &[&[0xd0, 0xcf, 0x11, 0xe0, 0xa1, 0xb1, 0x1a, 0xe1]]),
    ("application/x-sqlite3", &[b"SQLite format 3\0"]),
    ("application/x-deb", &[b"!<arch>"]),
    ("application/x-rpm", &[&[0xed, 0xab, 0xee, 0xdb]]),
    ("application/x-java-applet", &[&[0xca, 0xfe, 0xba, 0xbe]]),
    ("font/ttf", &[&[0x00, 0x01, 0x00, 0x00, 0x00]]),
    ("font/otf", &[b"OTTO"]),
    ("font/woff", &[b"wOFF"]),
    ("font/woff2", &[b"wOF2"]),
    ("application/x-iso9660-image", &[b"CD001"]),
    ("application/postscript", &[b"%!PS"]),
    ("image/vnd.adobe.photoshop", &[b"8BPS"]),
    ("video/x-flv", &[&[0x46, 0x4c, 0x56, 0x01]]),
    (
        "application/x-mach-binary",
        &[
            &[0xfe, 0xed, 0xfa, 0xce],
            &[0xfe, 0xed, 0xfa, 0xcf],
            &[0xce, 0xfa, 0xed, 0xfe],
            &[0xcf, 0xfa, 0xed, 0xfe],
        ],
    ),
    ("application/x-python-code", &[&[0x03, 0xf3, 0x0d, 0x0a]]),
];

/// Lowercased extension of `path`, without the dot.
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// True when the extension is in the binary table.
pub fn has_binary_extension(path: &Path) -> bool {
    match extension_of(path) {
        Some(ext) => BINARY_EXTENSIONS.contains(&ext.as_str()),
        None => false,
    }
}

/// Classify the head of a file.
///
/// Signatures are tried first; otherwise the head must be valid UTF-8
/// (a multi-byte sequence cut off by the read limit is accepted).
pub fn sniff_mime(head: &[u8]) -> &'static str {
    for (mime, signatures) in FILE_SIGNATURES {
        if signatures.iter().any(|sig| head.starts_with(sig)) {
            return mime;
        }
    }

    match std::str::from_utf8(head) {
        Ok(_) => "text/plain",
        Err(e) if e.error_len().is_none() => "text/plain",
        Err(_) => OCTET_STREAM,
    }
}

/// Sniff the MIME type of a file on disk. Unreadable files are octet-stream.
pub fn mime_type_of(path: &Path) -> &'static str {
    let mut head = Vec::with_capacity(SNIFF_LEN);
    let read = File::open(path).and_then(|f| f.take(SNIFF_LEN as u64).read_to_end(&mut head));
    match read {
        Ok(_) => sniff_mime(&head),
        Err(_) => OCTET_STREAM,
    }
}

pub fn is_text_mime(mime: &str) -> bool {
    TEXT_MIME_TYPES.iter().any(|text| {
        if text.ends_with('/') {
            mime.starts_with(text)
        } else {
            mime == *text
        }
    })
}

/// True when the file should be treated as binary.
pub fn is_binary_file(path: &Path) -> bool {
    if has_binary_extension(path) {
        return true;
    }
    !is_text_mime(mime_type_of(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_binary_extension_is_case_insensitive() {
        assert!(has_binary_extension(Path::new("assets/logo.PNG")));
        assert!(has_binary_extension(Path::new("lib.so")));
        assert!(!has_binary_extension(Path::new("src/main.rs")));
        assert!(!has_binary_extension(Path::new("Makefile")));
    }

    #[test]
    fn test_sniff_signatures() {
        assert_eq!(sniff_mime(b"%PDF-1.7\n"), "application/pdf");
        assert_eq!(sniff_mime(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a]), "image/png");
        assert_eq!(sniff_mime(&[0x7f, 0x45, 0x4c, 0x46, 0x02]), "application/x-executable");
        assert_eq!(sniff_mime(b"<svg xmlns=\"http://www.w3.org/2000/svg\">"), "image/svg+xml");
    }

    #[test]
    fn test_sniff_text_and_garbage() {
        assert_eq!(sniff_mime(b"fn main() {}\n"), "text/plain");
        assert_eq!(sniff_mime(b""), "text/plain");
        assert_eq!(sniff_mime(&[0x61, 0xff, 0xfe, 0x62]), OCTET_STREAM);
    }

    #[test]
    fn test_sniff_accepts_truncated_multibyte_tail() {
        // "é" is 0xc3 0xa9; the read limit may cut after the first byte
        assert_eq!(sniff_mime(&[b'a', b'b', 0xc3]), "text/plain");
    }

    #[test]
    fn test_text_mime_allow_list() {
        assert!(is_text_mime("text/html"));
        assert!(is_text_mime("application/json"));
        assert!(is_text_mime("application/xhtml+xml"));
        assert!(!is_text_mime("application/zip"));
        assert!(!is_text_mime("application/jsonp"));
        assert!(!is_text_mime("image/svg+xml"));
    }

    #[test]
    fn test_is_binary_file_on_disk() {
        let temp_dir = TempDir::new().unwrap();
        let text = temp_dir.path().join("notes.md");
        fs::write(&text, "# Notes\n").unwrap();
        let elf = temp_dir.path().join("tool");
        fs::write(&elf, [0x7f, 0x45, 0x4c, 0x46, 0, 0, 0]).unwrap();
        let fake_png = temp_dir.path().join("really_text.png");
        fs::write(&fake_png, "just text").unwrap();

        assert!(!is_binary_file(&text));
        assert!(is_binary_file(&elf));
        // The extension table wins over sniffing
        assert!(is_binary_file(&fake_png));
        // Missing files sniff as octet-stream
        assert!(is_binary_file(&temp_dir.path().join("missing.txt")));
    }
}
