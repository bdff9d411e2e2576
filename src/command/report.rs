//! User-facing report blocks printed around a turn.

use colored::Colorize;
use std::io::{self, Write};
use std::path::Path;

use crate::budget::{format_thousands, TokenCounter};
use crate::command::run::RunSettings;
use crate::domain::{FileBlock, UploadableFile};
use crate::writer::line_delta;

fn list_or_none<T: std::fmt::Display>(items: &[T]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items
            .iter()
            .map(|i| i.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn row<W: Write>(out: &mut W, label: &str, value: impl std::fmt::Display) -> io::Result<()> {
    let label = format!("{:>16}", format!("{}:", label));
    writeln!(out, "    {} {}", label.bright_magenta(), value.to_string().bright_blue())
}

pub fn write_configuration<W: Write>(
    out: &mut W,
    settings: &RunSettings,
    requirements: &str,
) -> io::Result<()> {
    writeln!(out, "{}", " 🏗️  BUILDING FEATURE:".yellow())?;
    writeln!(out, "    > {}", requirements.bright_blue())?;
    writeln!(out)?;
    writeln!(out, "{}", " ⚙️  CONFIGURATION:".yellow())?;

    let max_cost = match settings.max_estimated_cost {
        Some(cost) => format!("${:.2}", cost),
        None => "N/A".to_string(),
    };
    let images: Vec<String> = settings.images.iter().map(|p| p.display().to_string()).collect();

    row(out, "Directory", settings.root.display())?;
    row(out, "Model", &settings.model)?;
    row(out, "Max tokens", opt(settings.max_tokens))?;
    row(out, "Temperature", opt(settings.temperature))?;
    row(out, "Embedding Model", &settings.model_embedding)?;
    row(out, "Auto-write", settings.write)?;
    row(out, "Focused", opt(settings.focused))?;
    row(out, "Ignore", list_or_none(&settings.ignore))?;
    row(out, "Mode", settings.mode.as_str())?;
    row(out, "Resources", list_or_none(&settings.resources))?;
    row(out, "Image(s)", list_or_none(&images))?;
    row(out, "Max Est. Cost", max_cost)?;
    row(out, "Max File Size", format!("{} bytes", format_thousands(settings.max_file_size)))?;
    writeln!(out)
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

/// Ranked chunks with their scores.
pub fn write_focused_files<W: Write>(out: &mut W, files: &[UploadableFile]) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!(" 🔬  FOCUSING ON {} MOST RELEVANT FILE CHUNKS:", files.len()).yellow()
    )?;
    for file in files {
        writeln!(
            out,
            "    * {} {}",
            file.path.bright_blue(),
            format!("({:.2})", file.score.unwrap_or_default()).green()
        )?;
    }
    Ok(())
}

/// Every included file, with token counts when `counter` is given.
pub fn write_included_files<W: Write>(
    out: &mut W,
    files: &[UploadableFile],
    counter: Option<&TokenCounter>,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "{}",
        format!(" 🗂️  INCLUDING {} UNIGNORED FILES:", format_thousands(files.len() as u64)).yellow()
    )?;
    for file in files {
        match counter {
            Some(counter) => writeln!(
                out,
                "    * {} {}",
                file.path.bright_blue(),
                format!("({})", format_thousands(counter.count(&file.content) as u64)).red()
            )?,
            None => writeln!(out, "    * {}", file.path.bright_blue())?,
        }
    }
    Ok(())
}

/// Requirement history and per-file line deltas for one changeset.
pub fn write_changeset<W: Write>(
    out: &mut W,
    root: &Path,
    history: &[String],
    files: &[FileBlock],
) -> io::Result<()> {
    if files.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "{}", " 📃 REQUIREMENTS:".yellow())?;
    for (i, requirement) in history.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "    > {}", requirement.bright_blue())?;
    }

    writeln!(out)?;
    writeln!(out, "{}", " 📁 FILES TO UPDATE:".yellow())?;
    for file in files {
        let delta = line_delta(&root.join(&file.filename), &file.contents);
        writeln!(out, "    * {}", format!("{} ({:+})", file.filename, delta).green())?;
    }
    Ok(())
}
