use anyhow::Result;
use std::io::{self, Write};
use tracing::debug;

use crate::cli::resolve_workspace_root;
use crate::domain::UploadableFile;
use crate::workspace::{scan_workspace, IgnoreSpec, UploadFilter, DEFAULT_MAX_FILE_SIZE};

const SENSITIVE_PATTERNS: &[&str] = &["password", "secret", "credential", "api_key", "apikey"];

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.2} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

fn sensitive_paths(files: &[UploadableFile]) -> Vec<&str> {
    files
        .iter()
        .filter(|f| {
            let lower = f.path.to_lowercase();
            SENSITIVE_PATTERNS.iter().any(|p| lower.contains(p))
        })
        .map(|f| f.path.as_str())
        .collect()
}

pub fn write_preview<W: Write>(out: &mut W, files: &[UploadableFile], verbose: bool) -> io::Result<()> {
    let total_bytes: usize = files.iter().map(|f| f.content.len()).sum();

    writeln!(out, "Summary:")?;
    writeln!(out, "  Files to upload: {}", files.len())?;
    writeln!(out, "  Total size: {}", format_size(total_bytes))?;

    let sensitive = sensitive_paths(files);
    if !sensitive.is_empty() {
        writeln!(
            out,
            "\n⚠️  Warning: {} file(s) may contain sensitive data:",
            sensitive.len()
        )?;
        for path in &sensitive {
            writeln!(out, "    - {}", path)?;
        }
        writeln!(out, "\n  Consider adding these to .gitignore or passing --ignore")?;
    }

    if verbose {
        writeln!(out, "\nFiles:")?;
        for file in files {
            let size = file.content.len();
            let size_str = if size >= 1024 {
                format!("{:.1}K", size as f64 / 1024.0)
            } else {
                format!("{}B", size)
            };
            writeln!(out, "  {:>8}  {}", size_str, file.path)?;
        }
    } else if !files.is_empty() {
        writeln!(out, "\n  Use --verbose to see all files")?;
    }
    Ok(())
}

pub fn run_preview(
    dir: Option<String>,
    ignore: Vec<String>,
    max_file_size: Option<u64>,
    verbose: bool,
) -> Result<()> {
    let root = resolve_workspace_root(dir.as_deref())?;
    println!("Scanning workspace: {}\n", root.display());

    let spec = IgnoreSpec::for_workspace(&root, &ignore);
    let filter = UploadFilter::new(&root, spec, max_file_size.unwrap_or(DEFAULT_MAX_FILE_SIZE));
    debug!(
        "{} ignore rules, max file size {} bytes",
        filter.spec().patterns().len(),
        filter.max_file_size()
    );
    let files = scan_workspace(&filter);

    write_preview(&mut io::stdout(), &files, verbose)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.00 MB");
    }

    #[test]
    fn test_preview_flags_sensitive_names() {
        let files = vec![
            UploadableFile::unranked("src/main.rs", "fn main() {}"),
            UploadableFile::unranked("config/API_KEY.txt", "k"),
            UploadableFile::unranked("docs/secrets.md", "s"),
        ];
        let mut out = Vec::new();
        write_preview(&mut out, &files, true).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Files to upload: 3"));
        assert!(text.contains("2 file(s) may contain sensitive data"));
        assert!(text.contains("    - config/API_KEY.txt"));
        assert!(text.contains("       12B  src/main.rs"));
    }
}
