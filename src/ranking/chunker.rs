//! Overlapping, line-aware chunking.

use crate::domain::UploadableFile;

/// Target chunk size in bytes.
pub const CHUNK_SIZE: usize = 2500;

/// Bytes of trailing context repeated at the start of the next chunk.
pub const CHUNK_OVERLAP: usize = 20;

/// A slice of one file, tagged with its source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: String,
    /// Position of the source file in walk order
    pub file_index: usize,
    pub text: String,
}

/// Split `content` into chunks of at most `size` bytes.
///
/// Chunks break on line boundaries; a single line longer than `size` becomes
/// its own chunk. Whole trailing lines totalling at most `overlap` bytes
/// are repeated at the start of the next chunk. Whitespace-only chunks are
/// dropped.
pub fn split_text(content: &str, size: usize, overlap: usize) -> Vec<String> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    let mut chunks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_len = 0usize;

    for line in lines {
        if !current.is_empty() && current_len + line.len() > size {
            chunks.push(current.concat());

            // Carry whole trailing lines that fit in the overlap window
            let mut carried = Vec::new();
            let mut carried_len = 0usize;
            for prev in current.iter().rev() {
                if carried_len + prev.len() > overlap {
                    break;
                }
                carried_len += prev.len();
                carried.push(*prev);
            }
            carried.reverse();
            // Never carry so much that the new line still does not fit
            if carried_len + line.len() > size {
                carried.clear();
                carried_len = 0;
            }
            current = carried;
            current_len = carried_len;
        }

        current.push(line);
        current_len += line.len();
    }

    if !current.is_empty() {
        chunks.push(current.concat());
    }

    chunks.retain(|c| !c.trim().is_empty());
    chunks
}

/// Chunk every file with the fixed size and overlap.
pub fn chunk_files(files: &[UploadableFile]) -> Vec<Chunk> {
    files
        .iter()
        .enumerate()
        .flat_map(|(file_index, file)| {
            split_text(&file.content, CHUNK_SIZE, CHUNK_OVERLAP)
                .into_iter()
                .map(move |text| Chunk {
                    source: file.path.clone(),
                    file_index,
                    text,
                })
        })
        .collect()
}
