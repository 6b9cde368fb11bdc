//! Text extraction layer: document metadata plus per-page text pulled from
//! content stream show-text operations, with an OCR pass as fallback for
//! scanned statements. OCR is expensive, so the blank-text-layer check gates
//! it; a missing OCR backend degrades to a soft error field instead of
//! failing the whole extraction.

use std::collections::HashMap;

use pdf::object::PageRc;
use pdf::primitive::Primitive;
use serde::Serialize;

use crate::unlocker::OpenDocument;

/// External OCR collaborator. Implementations rasterize the given page of the
/// source document and return recognized text; the core treats this as an
/// opaque synchronous call.
pub trait OcrBackend {
    fn recognize_page(
        &self,
        source: &[u8],
        password: Option<&str>,
        page_number: u32,
    ) -> Result<String, String>;
}

#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    pub page_number: u32,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_text: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractedDocument {
    pub page_count: u32,
    pub metadata: HashMap<String, String>,
    pub pages: Vec<PageText>,
    pub ocr_performed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ocr_error: Option<String>,
}

impl ExtractedDocument {
    /// Direct text when any page has it, otherwise the OCR text.
    pub fn joined_text(&self) -> String {
        let direct: Vec<&str> = self.pages.iter().map(|p| p.text.as_str()).collect();
        let joined = direct.join("\n");
        if !joined.trim().is_empty() {
            return joined;
        }
        self.pages
            .iter()
            .filter_map(|p| p.ocr_text.as_deref())
            .collect::<Vec<&str>>()
            .join("\n")
    }

    /// Cheap gate used to decide whether paying for OCR is worthwhile:
    /// a real text layer yields more than a handful of characters.
    pub fn has_text_layer(&self) -> bool {
        let joined: String = self.pages.iter().map(|p| p.text.as_str()).collect();
        joined.trim().len() > 50
    }
}

fn primitive_to_string(value: &Primitive) -> String {
    match value {
        Primitive::String(s) => s.clone().into_string().unwrap_or_default(),
        other => format!("{}", other),
    }
}

fn document_metadata(file: &crate::unlocker::PdfDocument) -> HashMap<String, String> {
    let mut metadata = HashMap::new();
    if let Some(info) = file.trailer.info_dict.as_ref() {
        for (key, value) in info.iter() {
            metadata.insert(key.clone(), primitive_to_string(value));
        }
    }
    metadata
}

/// Collect show-text operands ("Tj" and "TJ") from one page, in order.
fn page_text(page: &PageRc) -> String {
    let mut pieces: Vec<String> = Vec::new();
    let contents = match page.contents.as_ref() {
        Some(c) => c,
        None => return String::new(),
    };
    for op in contents.operations.iter() {
        match op.operator.as_ref() {
            "Tj" => {
                if let Some(Primitive::String(s)) = op.operands.first() {
                    if let Ok(text) = s.clone().into_string() {
                        pieces.push(text);
                    }
                }
            }
            "TJ" => {
                if let Some(Primitive::Array(parts)) = op.operands.first() {
                    for part in parts {
                        if let Primitive::String(s) = part {
                            if let Ok(text) = s.clone().into_string() {
                                pieces.push(text);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    pieces.join("\n")
}

/// Extract metadata and per-page text from an unlocked document, up to
/// `max_pages` pages. When the direct text layer is blank and OCR was
/// requested (or a backend is available anyway), run the OCR pass over the
/// same page range.
pub fn extract(
    document: &OpenDocument,
    ocr_requested: bool,
    max_pages: Option<u32>,
    ocr: Option<&dyn OcrBackend>,
    password: Option<&str>,
) -> ExtractedDocument {
    let page_count = document.file.num_pages();
    let pages_to_check = match max_pages {
        Some(limit) => page_count.min(limit),
        None => page_count,
    };

    let mut extracted = ExtractedDocument {
        page_count,
        metadata: document_metadata(&document.file),
        pages: Vec::with_capacity(pages_to_check as usize),
        ocr_performed: false,
        ocr_error: None,
    };

    for (index, page) in document.file.pages().take(pages_to_check as usize).enumerate() {
        let page_number = index as u32 + 1;
        let text = match page {
            Ok(page) => page_text(&page),
            Err(e) => {
                log::warn!("Unable to read page {}: {}", page_number, e);
                String::new()
            }
        };
        extracted.pages.push(PageText {
            page_number,
            text,
            ocr_text: None,
        });
    }

    let direct: String = extracted.pages.iter().map(|p| p.text.as_str()).collect();
    if direct.trim().is_empty() && (ocr_requested || ocr.is_some()) {
        match ocr {
            None => {
                extracted.ocr_error = Some("no OCR backend configured".to_string());
            }
            Some(backend) => {
                for page in extracted.pages.iter_mut() {
                    match backend.recognize_page(&document.source, password, page.page_number) {
                        Ok(text) => page.ocr_text = Some(text),
                        Err(e) => {
                            log::warn!("OCR failed on page {}: {}", page.page_number, e);
                            page.ocr_text = Some(String::new());
                        }
                    }
                }
                extracted.ocr_performed = true;
            }
        }
    }

    extracted
}
