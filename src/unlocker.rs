//! PDF unlock engine: probe a document with no password, then with each
//! candidate in order. "This password did not work" is an expected outcome,
//! not an error, so every probe failure is swallowed and iteration continues.

pub type PdfDocument = pdf::file::File<Vec<u8>>;

/// An opened (decrypted in memory) statement. The handle is already past any
/// encryption so downstream extraction never needs the password again; the
/// source bytes are kept for the OCR boundary, scoped to one document's
/// lifecycle.
pub struct OpenDocument {
    pub file: PdfDocument,
    pub source: Vec<u8>,
}

pub enum UnlockResult {
    /// Document had no password; source bytes unchanged.
    AlreadyOpen(OpenDocument),
    /// A candidate matched.
    Unlocked {
        password: String,
        document: OpenDocument,
    },
    /// Candidate set exhausted. A corrupt document fails every open attempt
    /// too, so this does not prove the document was encrypted.
    Failed,
}

impl UnlockResult {
    pub fn password(&self) -> Option<&str> {
        match self {
            UnlockResult::Unlocked { password, .. } => Some(password),
            _ => None,
        }
    }
}

/// Try to open `data`, first without a password, then with each candidate.
pub fn unlock(data: Vec<u8>, candidates: &[String]) -> UnlockResult {
    match PdfDocument::from_data(data.clone()) {
        Ok(file) => {
            log::info!("Document opened without a password");
            return UnlockResult::AlreadyOpen(OpenDocument { file, source: data });
        }
        Err(e) => {
            // Likely encrypted; attempt candidates
            log::info!("Open without password failed ({}), probing candidates", e);
        }
    }

    for password in candidates {
        match PdfDocument::from_data_password(data.clone(), password.as_bytes()) {
            Ok(file) => {
                log::info!("Document unlocked with one of {} candidates", candidates.len());
                return UnlockResult::Unlocked {
                    password: password.clone(),
                    document: OpenDocument { file, source: data },
                };
            }
            Err(_) => continue,
        }
    }

    log::info!(
        "Exhausted {} candidates without unlocking the document",
        candidates.len()
    );
    UnlockResult::Failed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testpdf;

    #[test]
    fn test_unencrypted_document_is_already_open() {
        let data = testpdf::minimal_pdf(&["Opening Balance INR 500.00"]);
        match unlock(data.clone(), &[]) {
            UnlockResult::AlreadyOpen(doc) => assert_eq!(doc.source, data),
            _ => panic!("expected AlreadyOpen"),
        }
    }

    #[test]
    fn test_already_open_ignores_candidate_list() {
        let data = testpdf::minimal_pdf(&["page one"]);
        let candidates = vec!["Akshat17011999".to_string(), "43210170199".to_string()];
        assert!(matches!(
            unlock(data, &candidates),
            UnlockResult::AlreadyOpen(_)
        ));
    }

    #[test]
    fn test_garbage_bytes_fail_every_probe() {
        let candidates = vec!["Akshat17011999".to_string()];
        let result = unlock(b"this is not a pdf at all".to_vec(), &candidates);
        assert!(matches!(result, UnlockResult::Failed));
        assert!(result.password().is_none());
    }

    #[test]
    fn test_unlock_encrypted_statement() {
        // data/encrypted_sbi.pdf is protected with "43210170199"
        let data = std::fs::read("data/encrypted_sbi.pdf").unwrap();
        let candidates = vec!["wrong".to_string(), "43210170199".to_string()];
        match unlock(data, &candidates) {
            UnlockResult::Unlocked { password, document } => {
                assert_eq!(password, "43210170199");
                assert_eq!(document.file.num_pages(), 1);
            }
            _ => panic!("expected Unlocked"),
        }
    }

    #[test]
    fn test_unlock_fails_without_matching_candidate() {
        let data = std::fs::read("data/encrypted_sbi.pdf").unwrap();
        let candidates = vec!["wrong".to_string(), "alsowrong".to_string()];
        assert!(matches!(unlock(data.clone(), &candidates), UnlockResult::Failed));
        assert!(matches!(unlock(data, &[]), UnlockResult::Failed));
    }
}
