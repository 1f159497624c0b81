//! Font discovery for the compliance sheet.
//!
//! The coverage report uses the PDF builtin faces; only the flowing
//! compliance sheet needs TrueType files.  They are looked up in
//! `VAXREPORT_FONTS_DIR`, next to the executable under `assets/fonts`, and
//! finally under this crate's `assets/fonts`.

use std::env;
use std::path::{Path, PathBuf};

use genpdf::fonts::{self, FontData, FontFamily};
use log::{debug, warn};

use crate::error::{ReportError, Result};

/// Environment variable naming a directory that holds the font files.
pub const FONTS_DIR_VAR: &str = "VAXREPORT_FONTS_DIR";

/// Name of the expected font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const FONT_FILES: &[&str] = &[
    "Roboto-Regular.ttf",
    "Roboto-Bold.ttf",
    "Roboto-Italic.ttf",
    "Roboto-BoldItalic.ttf",
];

fn push_unique(candidates: &mut Vec<PathBuf>, candidate: PathBuf) {
    if !candidates.iter().any(|existing| existing == &candidate) {
        candidates.push(candidate);
    }
}

fn font_directory_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Some(path) = env::var_os(FONTS_DIR_VAR) {
        if !path.is_empty() {
            candidates.push(PathBuf::from(path));
        }
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push_unique(&mut candidates, bin_dir.join("assets/fonts"));
        }
    }

    push_unique(
        &mut candidates,
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"),
    );
    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FONT_FILES
        .iter()
        .copied()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Returns the first candidate directory holding every font file.
pub fn resolve_font_directory() -> Result<PathBuf> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates() {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }
        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            debug!("using fonts from {}", candidate.display());
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    let summary = if attempts.is_empty() {
        "no search paths were available".to_owned()
    } else {
        attempts.join(", ")
    };
    warn!("no usable font directory: {}", summary);
    Err(ReportError::Font(format!(
        "unable to locate the {} fonts. Checked: {}. Set {} to a directory containing {}.",
        DEFAULT_FONT_FAMILY_NAME,
        summary,
        FONTS_DIR_VAR,
        FONT_FILES.join(", ")
    )))
}

/// Loads the font family used by the compliance sheet.
pub fn default_font_family() -> Result<FontFamily<FontData>> {
    let directory = resolve_font_directory()?;
    fonts::from_files(&directory, DEFAULT_FONT_FAMILY_NAME, None).map_err(|err| {
        ReportError::Font(format!(
            "failed to load font family '{}' from {}: {}",
            DEFAULT_FONT_FAMILY_NAME,
            directory.display(),
            err
        ))
    })
}

/// Whether every font file needed by the compliance sheet can be found.
pub fn default_fonts_available() -> bool {
    font_directory_candidates()
        .iter()
        .any(|candidate| candidate.is_dir() && missing_font_files(candidate).is_empty())
}
