// SPDX-License-Identifier: BSD-3-Clause

pub mod ai;
pub mod banks;
pub mod credentials;
pub mod detector;
pub mod extractor;
pub mod generator;
mod logging;
pub mod parsers;
pub mod unlocker;

use serde::{Deserialize, Serialize};

pub use banks::Bank;
pub use extractor::{ExtractedDocument, OcrBackend, PageText};
pub use logging::ResultExt;
pub use unlocker::{OpenDocument, UnlockResult};

/// Raw identity fields as supplied by the user. Normalized before any use;
/// created per unlock attempt and discarded after candidate generation.
#[derive(Debug, Clone, Default)]
pub struct IdentityInput {
    pub full_name: String,
    pub phone: String,
    pub date_of_birth: String,
    pub bank_name: String,
}

/// Email headers accompanying a statement attachment, when it came from an
/// inbox. Both optional for directly uploaded documents.
#[derive(Debug, Clone, Default)]
pub struct EmailContext {
    pub sender: Option<String>,
    pub subject: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub max_candidates: usize,
    pub max_pages: Option<u32>,
    pub force_ocr: bool,
    /// User identifier for persisting a recovered password, when a store is
    /// injected.
    pub user_id: Option<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            max_candidates: 200,
            max_pages: None,
            force_ocr: false,
            user_id: None,
        }
    }
}

/// External store for recovered passwords, keyed by (user, bank) and upserted
/// idempotently. Persistence failures are soft; the pipeline continues.
pub trait PasswordStore {
    fn save_password(&mut self, user_id: &str, bank: Bank, password: &str) -> Result<(), String>;
}

/// Static fields as matched by the bank-specific regexes, before numeric
/// coercion. A field is None when its regex did not match.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleExtraction {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub opening_balance: Option<String>,
    pub closing_balance: Option<String>,
    pub ifsc: Option<String>,
    pub available_balance: Option<String>,
    pub statement_period: Option<String>,
}

/// Rule-based extraction after numeric coercion, as it appears in the
/// canonical record.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleBasedData {
    pub bank_name: Option<String>,
    pub account_number: Option<String>,
    pub opening_balance: Option<f64>,
    pub closing_balance: Option<f64>,
    pub ifsc: Option<String>,
    pub available_balance: Option<f64>,
    pub statement_period: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiTransaction {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "de_float_safe")]
    pub amount: Option<f64>,
    #[serde(rename = "type", default)]
    pub txn_type: Option<String>,
}

/// The AI collaborator's structured statement: the fixed required-keys
/// contract. Missing keys deserialize to null/empty, never a hard failure;
/// numeric fields accept numbers or separator-formatted strings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiStatement {
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_holder: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub statement_period: Option<String>,
    #[serde(default, deserialize_with = "de_float_safe")]
    pub opening_balance: Option<f64>,
    #[serde(default, deserialize_with = "de_float_safe")]
    pub closing_balance: Option<f64>,
    #[serde(default, deserialize_with = "de_float_safe")]
    pub total_credits: Option<f64>,
    #[serde(default, deserialize_with = "de_float_safe")]
    pub total_debits: Option<f64>,
    #[serde(default)]
    pub transactions: Vec<AiTransaction>,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl AiStatement {
    /// Null-filled fallback used whenever the collaborator is unavailable or
    /// returns something unusable.
    pub fn skeleton(bank: Bank) -> AiStatement {
        AiStatement {
            bank_name: if bank != Bank::Unknown {
                Some(bank.code().to_string())
            } else {
                None
            },
            ..Default::default()
        }
    }
}

/// One canonical record per input document; immutable after construction and
/// owned by the caller for the duration of one request.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalStatement {
    pub bank_detected: Bank,
    pub rule_based: RuleBasedData,
    pub ai_structured: AiStatement,
    pub cleaned_text: String,
    pub transactions_raw: Vec<String>,
}

/// Coerce a string with thousands separators and surrounding whitespace into
/// a float; unparseable values become None, never an error.
pub fn to_float_safe(value: Option<&str>) -> Option<f64> {
    let v = value?.replace(',', "");
    let v = v.trim();
    if v.is_empty() {
        return None;
    }
    v.parse::<f64>().ok()
}

fn de_float_safe<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => to_float_safe(Some(&s)),
        _ => None,
    })
}

/// Reconcile rule-based and AI extraction into one canonical statement.
/// Rule-based opening/closing balances are anchored to exact label matches
/// and overwrite the AI values whenever present.
pub fn merge_statement(
    rule: &RuleExtraction,
    mut ai: AiStatement,
    bank: Bank,
    cleaned_text: String,
    transactions_raw: Vec<String>,
) -> CanonicalStatement {
    let detected_code = if bank != Bank::Unknown {
        Some(bank.code().to_string())
    } else {
        None
    };

    let rule_based = RuleBasedData {
        bank_name: rule.bank_name.clone().or_else(|| detected_code.clone()),
        account_number: rule.account_number.clone(),
        opening_balance: to_float_safe(rule.opening_balance.as_deref()),
        closing_balance: to_float_safe(rule.closing_balance.as_deref()),
        ifsc: rule.ifsc.clone(),
        available_balance: to_float_safe(rule.available_balance.as_deref()),
        statement_period: rule.statement_period.clone(),
    };

    if ai.bank_name.is_none() {
        ai.bank_name = detected_code;
    }
    if rule_based.opening_balance.is_some() {
        ai.opening_balance = rule_based.opening_balance;
    }
    if rule_based.closing_balance.is_some() {
        ai.closing_balance = rule_based.closing_balance;
    }

    CanonicalStatement {
        bank_detected: bank,
        rule_based,
        ai_structured: ai,
        cleaned_text,
        transactions_raw,
    }
}

/// Full per-document pipeline: candidate generation, unlock, extraction,
/// bank detection, rule-based parsing and AI structuring, joined by the
/// merge step. Returns a per-document error instead of panicking; sibling
/// documents are unaffected.
pub fn process_statement(
    data: Vec<u8>,
    identity: &IdentityInput,
    email: &EmailContext,
    config: &PipelineConfig,
    ai: &dyn ai::AiCollaborator,
    ocr: Option<&dyn OcrBackend>,
    mut password_store: Option<&mut dyn PasswordStore>,
) -> Result<CanonicalStatement, String> {
    let tokens = credentials::normalize(identity);
    let candidates = generator::generate_from_tokens(&tokens, config.max_candidates);
    log::info!("Generated {} password candidates", candidates.len());

    let (document, password) = match unlocker::unlock(data, &candidates) {
        UnlockResult::AlreadyOpen(document) => (document, None),
        UnlockResult::Unlocked { password, document } => (document, Some(password)),
        UnlockResult::Failed => {
            return Err("unable to unlock document with generated candidates".to_string())
        }
    };

    if let (Some(pw), Some(store)) = (password.as_ref(), password_store.as_deref_mut()) {
        if let Some(user_id) = config.user_id.as_deref() {
            if let Err(e) = store.save_password(user_id, tokens.bank, pw) {
                log::warn!("Unable to persist recovered password: {}", e);
            }
        }
    }

    let mut extracted = extractor::extract(
        &document,
        config.force_ocr,
        config.max_pages,
        ocr,
        password.as_deref(),
    );
    if !config.force_ocr && !extracted.ocr_performed && !extracted.has_text_layer() {
        // scanned statement: request the OCR pass as an explicit flag would
        extracted = extractor::extract(&document, true, config.max_pages, ocr, password.as_deref());
    }
    if let Some(e) = extracted.ocr_error.as_deref() {
        log::warn!("OCR pass skipped: {}", e);
    }
    let raw_text = extracted.joined_text();

    let snippet: String = raw_text.chars().take(500).collect();
    let bank = detector::detect(
        email.sender.as_deref(),
        email.subject.as_deref(),
        Some(&snippet),
    );

    let (rule, transactions_raw, cleaned_text) = match parsers::get_parser(bank) {
        Some(parser) => {
            let parsed = parser.parse(&raw_text);
            (parsed.fields, parsed.transactions_raw, parsed.cleaned_text)
        }
        None => {
            log::info!("No rule-based parser for bank {}", bank.code());
            (
                RuleExtraction::default(),
                Vec::new(),
                parsers::clean_text(&raw_text),
            )
        }
    };

    let ai_structured = ai.structure_statement(&cleaned_text, bank);

    Ok(merge_statement(
        &rule,
        ai_structured,
        bank,
        cleaned_text,
        transactions_raw,
    ))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::NullCollaborator;

    #[test]
    fn test_to_float_safe() {
        assert_eq!(to_float_safe(Some("1,234.50")), Some(1234.50));
        assert_eq!(to_float_safe(Some(" 500.00 ")), Some(500.0));
        assert_eq!(to_float_safe(Some("abc")), None);
        assert_eq!(to_float_safe(Some("")), None);
        assert_eq!(to_float_safe(None), None);
    }

    #[test]
    fn test_merge_rule_balances_override_ai() {
        let rule = RuleExtraction {
            opening_balance: Some("500.00".to_string()),
            ..Default::default()
        };
        let ai = AiStatement {
            opening_balance: Some(499.99),
            closing_balance: Some(720.10),
            ..Default::default()
        };
        let merged = merge_statement(&rule, ai, Bank::HDFC, String::new(), vec![]);
        assert_eq!(merged.ai_structured.opening_balance, Some(500.0));
        // rule-based closing is null, AI value passes through
        assert_eq!(merged.ai_structured.closing_balance, Some(720.10));
        assert_eq!(merged.rule_based.opening_balance, Some(500.0));
    }

    #[test]
    fn test_merge_defaults_bank_names() {
        let merged = merge_statement(
            &RuleExtraction::default(),
            AiStatement::default(),
            Bank::SBI,
            String::new(),
            vec![],
        );
        assert_eq!(merged.rule_based.bank_name.as_deref(), Some("SBI"));
        assert_eq!(merged.ai_structured.bank_name.as_deref(), Some("SBI"));

        let merged = merge_statement(
            &RuleExtraction::default(),
            AiStatement::default(),
            Bank::Unknown,
            String::new(),
            vec![],
        );
        assert_eq!(merged.rule_based.bank_name, None);
        assert_eq!(merged.ai_structured.bank_name, None);
    }

    #[test]
    fn test_ai_statement_lenient_parsing() {
        let json = r#"{
            "account_number": "1234567890",
            "bank_name": "HDFC",
            "opening_balance": "1,000.50",
            "closing_balance": 2500,
            "total_credits": null,
            "transactions": [
                {"date": "17/01/2024", "description": "UPI", "amount": "450.00", "type": "debit"}
            ],
            "insights": ["spending is stable"]
        }"#;
        let parsed: AiStatement = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.opening_balance, Some(1000.50));
        assert_eq!(parsed.closing_balance, Some(2500.0));
        assert_eq!(parsed.total_credits, None);
        assert_eq!(parsed.total_debits, None);
        assert_eq!(parsed.account_holder, None);
        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].amount, Some(450.0));
        assert_eq!(parsed.transactions[0].txn_type.as_deref(), Some("debit"));
    }

    struct RecordingStore {
        saved: Vec<(String, Bank, String)>,
    }

    impl PasswordStore for RecordingStore {
        fn save_password(
            &mut self,
            user_id: &str,
            bank: Bank,
            password: &str,
        ) -> Result<(), String> {
            self.saved
                .push((user_id.to_string(), bank, password.to_string()));
            Ok(())
        }
    }

    #[test]
    fn test_pipeline_on_unencrypted_statement() {
        let data = testpdf::minimal_pdf(&[
            "Account Number: 12345678901 IFSC: HDFC0001234 \
             Opening Balance: 1,000.50 Closing Balance: 2,500.00",
        ]);
        let identity = IdentityInput {
            full_name: "Akshat Sharma".to_string(),
            phone: "9876543210".to_string(),
            date_of_birth: "17011999".to_string(),
            bank_name: "HDFC".to_string(),
        };
        let email = EmailContext {
            sender: Some("statements@alerts.hdfcbank.net".to_string()),
            subject: Some("Your HDFC Bank statement".to_string()),
        };
        let config = PipelineConfig {
            user_id: Some("user-1".to_string()),
            ..Default::default()
        };
        let mut store = RecordingStore { saved: vec![] };

        let statement = process_statement(
            data,
            &identity,
            &email,
            &config,
            &NullCollaborator,
            None,
            Some(&mut store),
        )
        .unwrap();

        assert_eq!(statement.bank_detected, Bank::HDFC);
        assert_eq!(statement.rule_based.opening_balance, Some(1000.50));
        assert_eq!(statement.rule_based.closing_balance, Some(2500.0));
        assert_eq!(statement.rule_based.ifsc.as_deref(), Some("HDFC0001234"));
        // rule-based balances overwrite the (null-skeleton) AI values
        assert_eq!(statement.ai_structured.opening_balance, Some(1000.50));
        assert_eq!(statement.ai_structured.bank_name.as_deref(), Some("HDFC"));
        // document was not encrypted, nothing to persist
        assert!(store.saved.is_empty());
    }

    struct FixedOcr(&'static str);

    impl OcrBackend for FixedOcr {
        fn recognize_page(
            &self,
            _source: &[u8],
            _password: Option<&str>,
            _page_number: u32,
        ) -> Result<String, String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_pipeline_scanned_statement_goes_through_ocr() {
        let data = testpdf::minimal_pdf(&[""]);
        let backend = FixedOcr(
            "STATE BANK OF INDIA Account Number: 12345678901 Opening Balance: 1,000.00",
        );
        let statement = process_statement(
            data,
            &IdentityInput::default(),
            &EmailContext::default(),
            &PipelineConfig::default(),
            &NullCollaborator,
            Some(&backend),
            None,
        )
        .unwrap();
        assert_eq!(statement.bank_detected, Bank::SBI);
        assert_eq!(statement.rule_based.account_number.as_deref(), Some("12345678901"));
        assert_eq!(statement.rule_based.opening_balance, Some(1000.0));
    }

    #[test]
    fn test_pipeline_scanned_statement_without_backend_degrades_softly() {
        // blank text layer, no backend, no --ocr: still a canonical record
        let data = testpdf::minimal_pdf(&[""]);
        let statement = process_statement(
            data,
            &IdentityInput::default(),
            &EmailContext::default(),
            &PipelineConfig::default(),
            &NullCollaborator,
            None,
            None,
        )
        .unwrap();
        assert_eq!(statement.bank_detected, Bank::Unknown);
        assert!(statement.cleaned_text.is_empty());
        assert!(statement.transactions_raw.is_empty());
    }

    #[test]
    fn test_pipeline_reports_unreadable_document() {
        let err = process_statement(
            b"not a pdf".to_vec(),
            &IdentityInput::default(),
            &EmailContext::default(),
            &PipelineConfig::default(),
            &NullCollaborator,
            None,
            None,
        )
        .unwrap_err();
        assert!(err.contains("unable to unlock"));
    }
}
