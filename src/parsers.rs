//! Rule-based statement parsing: a shared baseline text cleaner, a
//! `BankParser` trait with registry-driven default behavior, and one thin
//! parser per supported bank. The regexes live in the bank registry so a new
//! statement layout is a registry edit, not a parser rewrite.

use regex::Regex;

use crate::banks::{Bank, BankProfile};
use crate::RuleExtraction;

/// Output of one parser run over one document's text.
#[derive(Debug, Clone)]
pub struct ParsedBankData {
    pub bank: Bank,
    pub fields: RuleExtraction,
    pub transactions_raw: Vec<String>,
    pub cleaned_text: String,
}

/// Baseline cleaner applied to every statement before bank-specific cleanup:
/// line ending normalization, whitespace collapse, dash and rupee-sign
/// normalization. Idempotent.
pub fn clean_text(raw: &str) -> String {
    let text = raw.replace('\r', "\n");
    let text = Regex::new(r"\n+").unwrap().replace_all(&text, "\n");
    let text = Regex::new(r"\t+").unwrap().replace_all(&text, " ");
    let text = Regex::new("[ \u{00A0}]{2,}").unwrap().replace_all(&text, " ");
    let text = text.replace('\u{2013}', "-").replace('\u{2014}', "-");
    let text = text.replace('\u{20B9}', "INR");
    text.trim().to_string()
}

fn strip_letterhead(text: &str, profile: &BankProfile) -> String {
    let mut cleaned = text.to_string();
    for pattern in profile.letterhead_noise {
        cleaned = Regex::new(pattern)
            .unwrap()
            .replace_all(&cleaned, "")
            .into_owned();
    }
    cleaned
}

fn is_monetary(value: &str) -> bool {
    Regex::new(r"^[\d,]+\.\d{2}$").unwrap().is_match(value)
}

fn capture_field(pattern: &str, text: &str) -> Option<String> {
    let captured = Regex::new(pattern).unwrap().captures(text)?.get(1)?;
    let value = captured.as_str().trim();
    if is_monetary(value) {
        Some(value.replace(',', ""))
    } else {
        Some(value.to_string())
    }
}

/// One rule-based parser per bank. `clean` and the extraction steps default
/// to registry-driven behavior; a bank overrides only where its statements
/// deviate from the common shape.
pub trait BankParser {
    fn bank(&self) -> Bank;

    fn profile(&self) -> &'static BankProfile {
        // get_parser only constructs parsers for registered banks
        self.bank().profile().unwrap()
    }

    /// Bank-specific cleanup on top of the shared baseline cleaner.
    fn clean(&self, text: &str) -> String {
        strip_letterhead(&clean_text(text), self.profile())
    }

    fn extract_fields(&self, text: &str) -> RuleExtraction {
        let fields = &self.profile().fields;
        RuleExtraction {
            bank_name: Some(self.bank().code().to_string()),
            account_number: capture_field(fields.account_number, text),
            opening_balance: capture_field(fields.opening_balance, text),
            closing_balance: capture_field(fields.closing_balance, text),
            ifsc: capture_field(fields.ifsc, text),
            available_balance: capture_field(fields.available_balance, text),
            statement_period: capture_field(fields.statement_period, text),
        }
    }

    /// Raw transaction lines: date-and-amount co-occurrences, each collapsed
    /// to single-space separation. Precise decomposition into columns is the
    /// AI collaborator's job.
    fn extract_transactions(&self, text: &str) -> Vec<String> {
        let line = Regex::new(self.profile().transaction_line).unwrap();
        line.captures_iter(text)
            .filter_map(|c| c.get(1))
            .map(|m| {
                m.as_str()
                    .split_whitespace()
                    .collect::<Vec<&str>>()
                    .join(" ")
            })
            .collect()
    }

    fn parse(&self, raw_text: &str) -> ParsedBankData {
        let cleaned = self.clean(raw_text);
        ParsedBankData {
            bank: self.bank(),
            fields: self.extract_fields(&cleaned),
            transactions_raw: self.extract_transactions(&cleaned),
            cleaned_text: cleaned,
        }
    }
}

pub struct HdfcParser;

impl BankParser for HdfcParser {
    fn bank(&self) -> Bank {
        Bank::HDFC
    }

    /// HDFC statements wrap amounts across lines, splitting the paise part
    /// off ("1,23\n4.00" shapes); rejoin digits separated by comma-whitespace
    /// before extraction.
    fn clean(&self, text: &str) -> String {
        let cleaned = strip_letterhead(&clean_text(text), self.profile());
        Regex::new(r"(\d),\s+(\d{2}\b)")
            .unwrap()
            .replace_all(&cleaned, "${1}${2}")
            .into_owned()
    }
}

pub struct IciciParser;

impl BankParser for IciciParser {
    fn bank(&self) -> Bank {
        Bank::ICICI
    }
}

pub struct SbiParser;

impl BankParser for SbiParser {
    fn bank(&self) -> Bank {
        Bank::SBI
    }
}

pub struct AxisParser;

impl BankParser for AxisParser {
    fn bank(&self) -> Bank {
        Bank::AXIS
    }
}

pub struct KotakParser;

impl BankParser for KotakParser {
    fn bank(&self) -> Bank {
        Bank::KOTAK
    }
}

pub struct CanaraParser;

impl BankParser for CanaraParser {
    fn bank(&self) -> Bank {
        Bank::CANARA
    }
}

pub struct BobParser;

impl BankParser for BobParser {
    fn bank(&self) -> Bank {
        Bank::BOB
    }
}

/// Parser for a detected bank; `Unknown` has none and the caller falls back
/// to AI-only structuring.
pub fn get_parser(bank: Bank) -> Option<Box<dyn BankParser>> {
    match bank {
        Bank::HDFC => Some(Box::new(HdfcParser)),
        Bank::ICICI => Some(Box::new(IciciParser)),
        Bank::SBI => Some(Box::new(SbiParser)),
        Bank::AXIS => Some(Box::new(AxisParser)),
        Bank::KOTAK => Some(Box::new(KotakParser)),
        Bank::CANARA => Some(Box::new(CanaraParser)),
        Bank::BOB => Some(Box::new(BobParser)),
        Bank::Unknown => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_baseline() {
        let raw = "HDFC  BANK\r\n\r\nStatement\t\tPeriod \u{2013} Jan\n\n\n\u{20B9} 500.00  ";
        let cleaned = clean_text(raw);
        assert_eq!(cleaned, "HDFC BANK\nStatement Period - Jan\nINR 500.00");
        // idempotent
        assert_eq!(clean_text(&cleaned), cleaned);
    }

    #[test]
    fn test_clean_text_collapses_nbsp_runs() {
        assert_eq!(clean_text("a\u{00A0}\u{00A0}b"), "a b");
    }

    #[test]
    fn test_hdfc_field_extraction() {
        let text = "HDFC BANK LIMITED\n\
                    Account Number: 12345678901\n\
                    IFSC Code: HDFC0001234\n\
                    Statement Period: 01/01/2024 to 31/01/2024\n\
                    Opening Balance: 1,000.50\n\
                    Closing Balance INR 2,500.00\n\
                    Available Balance: 2,500.00\n\
                    Page 1 of 2";
        let parsed = HdfcParser.parse(text);
        assert_eq!(parsed.fields.bank_name.as_deref(), Some("HDFC"));
        assert_eq!(parsed.fields.account_number.as_deref(), Some("12345678901"));
        assert_eq!(parsed.fields.ifsc.as_deref(), Some("HDFC0001234"));
        // monetary values come back comma-stripped
        assert_eq!(parsed.fields.opening_balance.as_deref(), Some("1000.50"));
        assert_eq!(parsed.fields.closing_balance.as_deref(), Some("2500.00"));
        assert_eq!(
            parsed.fields.statement_period.as_deref(),
            Some("01/01/2024 to 31/01/2024")
        );
        // letterhead noise is stripped before extraction
        assert!(!parsed.cleaned_text.contains("HDFC BANK LIMITED"));
        assert!(!parsed.cleaned_text.contains("Page 1 of 2"));
    }

    #[test]
    fn test_hdfc_linewrap_repair() {
        // paise split onto the next line after the comma is rejoined
        let repaired = HdfcParser.clean("closing balance 5,\n00.45 end");
        assert!(repaired.contains("500.45"));
        // a normal amount is untouched
        let cleaned = HdfcParser.clean("Opening Balance: 1,234.56 stays");
        assert!(cleaned.contains("1,234.56 stays"));
    }

    #[test]
    fn test_hdfc_transaction_lines() {
        let text = "17 Jan UPI GROCERIES\nRs. 450.00\n18 Jan SALARY CREDIT INR 50,000.00";
        let lines = HdfcParser.extract_transactions(&HdfcParser.clean(text));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "17 Jan UPI GROCERIES Rs. 450.00");
        assert_eq!(lines[1], "18 Jan SALARY CREDIT INR 50,000.00");
    }

    #[test]
    fn test_icici_transaction_lines_use_slash_dates() {
        let text = "01/01/2024 UPI-SWIGGY payment INR 1,234.00\nno date no amount here";
        let parsed = IciciParser.parse(text);
        assert_eq!(parsed.transactions_raw.len(), 1);
        assert_eq!(
            parsed.transactions_raw[0],
            "01/01/2024 UPI-SWIGGY payment INR 1,234.00"
        );
    }

    #[test]
    fn test_missing_fields_are_null() {
        let parsed = SbiParser.parse("STATE BANK OF INDIA\nnothing useful in here");
        assert_eq!(parsed.fields.bank_name.as_deref(), Some("SBI"));
        assert_eq!(parsed.fields.account_number, None);
        assert_eq!(parsed.fields.opening_balance, None);
        assert_eq!(parsed.fields.statement_period, None);
        assert!(parsed.transactions_raw.is_empty());
    }

    #[test]
    fn test_unknown_bank_has_no_parser() {
        assert!(get_parser(Bank::Unknown).is_none());
        assert!(get_parser(Bank::KOTAK).is_some());
    }
}
