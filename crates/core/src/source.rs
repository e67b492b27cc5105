use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

const CONTENT_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("bmp", "image/bmp"),
    ("tif", "image/tiff"),
    ("tiff", "image/tiff"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
    ("avif", "image/avif"),
    ("svg", "image/svg+xml"),
    ("ico", "image/x-icon"),
    ("mp4", "video/mp4"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("mp3", "audio/mpeg"),
    ("wav", "audio/wav"),
    ("m4a", "audio/mp4"),
    ("pdf", "application/pdf"),
    ("zip", "application/zip"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("csv", "text/csv"),
    ("md", "text/markdown"),
    ("html", "text/html"),
];

#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Local>,
    pub bytes: Arc<[u8]>,
}

impl SourceFile {
    pub fn new(
        name: impl Into<String>,
        content_type: impl Into<String>,
        last_modified: DateTime<Local>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            content_type: content_type.into(),
            last_modified,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("ファイルを読めませんでした: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|v| v.to_string_lossy().to_string())
            .unwrap_or_else(|| "untitled".to_string());
        let last_modified = file_modified_to_local(path).unwrap_or_else(Local::now);

        Ok(Self::new(
            name,
            content_type_for_path(path),
            last_modified,
            bytes,
        ))
    }

    pub fn is_image(&self) -> bool {
        self.content_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

pub fn content_type_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension() else {
        return DEFAULT_CONTENT_TYPE;
    };
    let ext = ext.to_string_lossy();
    CONTENT_TYPES
        .iter()
        .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        .map(|(_, content_type)| *content_type)
        .unwrap_or(DEFAULT_CONTENT_TYPE)
}

/// Expands directories into their files. Explicit file paths keep their given order.
pub fn collect_input_files(
    inputs: &[PathBuf],
    recursive: bool,
    include_hidden: bool,
) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();

    for input in inputs {
        if input.is_file() {
            out.push(input.clone());
            continue;
        }
        if !input.is_dir() {
            anyhow::bail!("入力パスが存在しません: {}", input.display());
        }

        if recursive {
            for entry in WalkDir::new(input).sort_by_file_name() {
                let entry = entry
                    .with_context(|| format!("フォルダ走査に失敗しました: {}", input.display()))?;
                let path = entry.path();
                if path.is_dir() {
                    continue;
                }
                if is_hidden(path) && !include_hidden {
                    continue;
                }
                out.push(path.to_path_buf());
            }
        } else {
            let mut files = Vec::new();
            for entry in fs::read_dir(input)
                .with_context(|| format!("フォルダを読めませんでした: {}", input.display()))?
            {
                let entry =
                    entry.with_context(|| format!("エントリ読み取り失敗: {}", input.display()))?;
                let path = entry.path();
                if path.is_dir() {
                    continue;
                }
                if is_hidden(&path) && !include_hidden {
                    continue;
                }
                files.push(path);
            }
            files.sort();
            out.extend(files);
        }
    }

    Ok(out)
}

pub fn load_sources(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
    paths
        .par_iter()
        .map(|path| SourceFile::from_path(path))
        .collect()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn file_modified_to_local(path: &Path) -> Option<DateTime<Local>> {
    let time = fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::from(time))
}
