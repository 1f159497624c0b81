//! PDF outline built from the paginator's landmarks with `lopdf`.

use std::collections::BTreeMap;

use lopdf::{Dictionary, Document, Object, ObjectId};

use crate::paginate::Landmark;

/// Errors that can occur while embedding an outline into a rendered report.
#[derive(Debug)]
pub enum BookmarkError {
    /// The PDF bytes could not be parsed by `lopdf`.
    Parse(lopdf::Error),
    /// The trailer has no catalog reference.
    MissingCatalog,
    /// The catalog object is not a dictionary.
    InvalidCatalog,
    /// A landmark points past the last page.
    MissingPage { title: String, page: usize },
}

impl From<lopdf::Error> for BookmarkError {
    fn from(err: lopdf::Error) -> Self {
        Self::Parse(err)
    }
}

impl From<std::io::Error> for BookmarkError {
    fn from(err: std::io::Error) -> Self {
        Self::Parse(err.into())
    }
}

impl std::fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "Failed to parse PDF bytes: {err}"),
            Self::MissingCatalog => write!(f, "PDF catalog entry is missing"),
            Self::InvalidCatalog => write!(f, "PDF catalog entry is not a dictionary"),
            Self::MissingPage { title, page } => {
                write!(f, "Outline entry '{}' refers to missing page {}", title, page)
            }
        }
    }
}

impl std::error::Error for BookmarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::MissingCatalog | Self::InvalidCatalog | Self::MissingPage { .. } => None,
        }
    }
}

/// Adds a flat `/Outlines` tree with one `/Dest [page /Fit]` entry per landmark.
///
/// Returns the input unchanged when there are no landmarks.
pub fn apply_landmark_bookmarks(
    pdf_bytes: &[u8],
    landmarks: &[Landmark],
) -> Result<Vec<u8>, BookmarkError> {
    if landmarks.is_empty() {
        return Ok(pdf_bytes.to_vec());
    }

    let mut document = Document::load_mem(pdf_bytes)?;
    let pages = document.get_pages();
    let mut entries = collect_outline_entries(&mut document, landmarks, &pages)?;

    let outlines_id = document.new_object_id();
    link_outline_entries(outlines_id, &mut document, &mut entries);
    insert_outlines_root(outlines_id, &mut document, &entries)?;

    let mut buffer = Vec::new();
    document.save_to(&mut buffer)?;
    Ok(buffer)
}

struct OutlineEntry {
    object_id: ObjectId,
    page_ref: ObjectId,
    title: String,
}

fn collect_outline_entries(
    document: &mut Document,
    landmarks: &[Landmark],
    pages: &BTreeMap<u32, ObjectId>,
) -> Result<Vec<OutlineEntry>, BookmarkError> {
    landmarks
        .iter()
        .map(|landmark| {
            let page_ref = pages
                .get(&(landmark.page as u32))
                .copied()
                .ok_or_else(|| BookmarkError::MissingPage {
                    title: landmark.title.clone(),
                    page: landmark.page,
                })?;
            Ok(OutlineEntry {
                object_id: document.new_object_id(),
                page_ref,
                title: landmark.title.clone(),
            })
        })
        .collect()
}

fn link_outline_entries(outlines_id: ObjectId, document: &mut Document, entries: &mut [OutlineEntry]) {
    for index in 0..entries.len() {
        let mut dictionary = Dictionary::new();
        dictionary.set("Title", Object::string_literal(entries[index].title.as_str()));
        dictionary.set(
            "Dest",
            Object::Array(vec![
                Object::Reference(entries[index].page_ref),
                Object::Name("Fit".into()),
            ]),
        );
        dictionary.set("Parent", Object::Reference(outlines_id));
        if index > 0 {
            dictionary.set("Prev", Object::Reference(entries[index - 1].object_id));
        }
        if index + 1 < entries.len() {
            dictionary.set("Next", Object::Reference(entries[index + 1].object_id));
        }

        document
            .objects
            .insert(entries[index].object_id, Object::Dictionary(dictionary));
    }
}

fn insert_outlines_root(
    outlines_id: ObjectId,
    document: &mut Document,
    entries: &[OutlineEntry],
) -> Result<(), BookmarkError> {
    let catalog_id = document
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .map_err(|_| BookmarkError::MissingCatalog)?;

    let catalog = document
        .objects
        .get_mut(&catalog_id)
        .ok_or(BookmarkError::MissingCatalog)?
        .as_dict_mut()
        .map_err(|_| BookmarkError::InvalidCatalog)?;

    let mut dictionary = Dictionary::new();
    dictionary.set("Type", Object::Name("Outlines".into()));
    dictionary.set("Count", Object::Integer(entries.len() as i64));
    if let Some(first) = entries.first() {
        dictionary.set("First", Object::Reference(first.object_id));
    }
    if let Some(last) = entries.last() {
        dictionary.set("Last", Object::Reference(last.object_id));
    }

    catalog.set("Outlines", Object::Reference(outlines_id));
    document
        .objects
        .insert(outlines_id, Object::Dictionary(dictionary));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, TextStyle};
    use crate::pdf::PdfCanvas;

    fn two_page_pdf() -> Vec<u8> {
        let mut canvas = PdfCanvas::new("Outline");
        for page in 1..=2 {
            canvas.add_page(2970, 2100).unwrap();
            canvas
                .draw_text(100, 100, &TextStyle::bold(12), &format!("Page {page}"))
                .unwrap();
        }
        canvas.finish().unwrap()
    }

    #[test]
    fn adds_one_entry_per_landmark() {
        let landmarks = vec![
            Landmark {
                title: "January 2024".into(),
                page: 1,
            },
            Landmark {
                title: "Vaccination Summary".into(),
                page: 2,
            },
        ];
        let bytes = apply_landmark_bookmarks(&two_page_pdf(), &landmarks).unwrap();

        let document = Document::load_mem(&bytes).unwrap();
        let catalog = document.catalog().unwrap();
        let outlines = catalog.get(b"Outlines").and_then(Object::as_reference).unwrap();
        let root = document.get_dictionary(outlines).unwrap();
        assert_eq!(root.get(b"Count").and_then(Object::as_i64).unwrap(), 2);
    }

    #[test]
    fn landmark_past_last_page_is_rejected() {
        let landmarks = vec![Landmark {
            title: "Nowhere".into(),
            page: 9,
        }];
        assert!(matches!(
            apply_landmark_bookmarks(&two_page_pdf(), &landmarks),
            Err(BookmarkError::MissingPage { page: 9, .. })
        ));
    }
}
