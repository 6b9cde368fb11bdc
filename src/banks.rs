//! Closed set of supported banks plus the static per-bank registry:
//! password templates, field extraction regexes, sender domains, subject
//! keywords and transaction line shapes. Adding a bank means adding one
//! `BankProfile` entry here, no pipeline changes.

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone)]
pub enum Bank {
    HDFC,
    ICICI,
    SBI,
    AXIS,
    KOTAK,
    CANARA,
    BOB,
    Unknown,
}

impl Bank {
    pub fn code(&self) -> &'static str {
        match self {
            Bank::HDFC => "HDFC",
            Bank::ICICI => "ICICI",
            Bank::SBI => "SBI",
            Bank::AXIS => "AXIS",
            Bank::KOTAK => "KOTAK",
            Bank::CANARA => "CANARA",
            Bank::BOB => "BOB",
            Bank::Unknown => "UNKNOWN",
        }
    }

    /// Map free-text bank names ("State Bank of India", "sbi", "Bank of
    /// Baroda"...) onto the closed enumeration.
    pub fn normalize(name: &str) -> Bank {
        let n = name.trim().to_lowercase();
        if n.is_empty() {
            return Bank::Unknown;
        }
        if n.contains("hdfc") {
            Bank::HDFC
        } else if n.contains("icici") {
            Bank::ICICI
        } else if n.contains("sbi") || n.contains("state bank") {
            Bank::SBI
        } else if n.contains("axis") {
            Bank::AXIS
        } else if n.contains("kotak") {
            Bank::KOTAK
        } else if n.contains("canara") {
            Bank::CANARA
        } else if n.contains("baroda") || n == "bob" {
            Bank::BOB
        } else {
            Bank::Unknown
        }
    }

    pub fn profile(&self) -> Option<&'static BankProfile> {
        PROFILES.iter().find(|p| p.bank == *self)
    }

    /// All real banks, excluding `Unknown`.
    pub fn all() -> &'static [Bank] {
        &[
            Bank::HDFC,
            Bank::ICICI,
            Bank::SBI,
            Bank::AXIS,
            Bank::KOTAK,
            Bank::CANARA,
            Bank::BOB,
        ]
    }
}

impl serde::Serialize for Bank {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

/// Per-key regexes for static statement fields. A failed match means the
/// field is null, never an error.
pub struct FieldPatterns {
    pub account_number: &'static str,
    pub opening_balance: &'static str,
    pub closing_balance: &'static str,
    pub ifsc: &'static str,
    pub available_balance: &'static str,
    pub statement_period: &'static str,
}

pub struct BankProfile {
    pub bank: Bank,
    pub subject_keywords: &'static [&'static str],
    pub sender_domains: &'static [&'static str],
    /// Empty list means: use `DEFAULT_TEMPLATES`.
    pub password_templates: &'static [&'static str],
    /// Letterhead/footer boilerplate removed before field extraction.
    pub letterhead_noise: &'static [&'static str],
    pub fields: FieldPatterns,
    pub transaction_line: &'static str,
}

/// Password templates tried when a bank has no dedicated list. Order matters:
/// more likely schemes come first so they are tried before the bound is hit.
pub const DEFAULT_TEMPLATES: &[&str] = &[
    "{first4}{dob_ddmm}",
    "{first4upper}{year}",
    "{first4upper}{dob_ddmm}",
    "{first}{dob}",
    "{first}{dob_short}",
    "{first}{last}",
    "{first}{phone4}",
    "{last}{dob}",
    "{initials}{dob}",
    "{bank}{phone4}",
    "{bank}{dob_short}",
];

const ACCOUNT_NUMBER: &str = r"(?i)account\s*(?:no|number)\.?\s*[:\-]?\s*([0-9Xx\*]{6,20})";
const OPENING_BALANCE: &str = r"(?i)opening\s*balance\s*[:\-]?\s*(?:INR|Rs\.?)?\s*([\d,]+\.\d{2})";
const CLOSING_BALANCE: &str = r"(?i)closing\s*balance\s*[:\-]?\s*(?:INR|Rs\.?)?\s*([\d,]+\.\d{2})";
const IFSC: &str = r"(?i)IFSC\s*(?:code)?\s*[:\-]?\s*([A-Z]{4}0[A-Z0-9]{6})";
const AVAILABLE_BALANCE: &str =
    r"(?i)available\s*balance\s*[:\-]?\s*(?:INR|Rs\.?)?\s*([\d,]+\.\d{2})";
const STATEMENT_PERIOD: &str = r"(?i)(?:statement\s*period|for\s*the\s*period|period)\s*[:\-]?\s*(\d{1,2}[-/ ][A-Za-z0-9]{2,9}[-/ ]\d{2,4}\s*(?:to|-)\s*\d{1,2}[-/ ][A-Za-z0-9]{2,9}[-/ ]\d{2,4})";

const COMMON_FIELDS: FieldPatterns = FieldPatterns {
    account_number: ACCOUNT_NUMBER,
    opening_balance: OPENING_BALANCE,
    closing_balance: CLOSING_BALANCE,
    ifsc: IFSC,
    available_balance: AVAILABLE_BALANCE,
    statement_period: STATEMENT_PERIOD,
};

// Transaction line shapes: date-and-amount co-occurrence, coarse on purpose.
// HDFC/CANARA/BOB statements carry "17 Jan ..." dates, ICICI/SBI/AXIS/KOTAK
// slash or dash dates.
const LINE_DAY_MONTH: &str = r"(?is)(\d{1,2}\s+[A-Za-z]{3,}\s+.+?(?:INR|Rs\.?)\s*[\d,]+\.\d{2})";
const LINE_SLASH_DATE: &str = r"(?is)(\d{1,2}[/\-]\d{1,2}[/\-]\d{2,4}.*?(?:INR|Rs\.?)\s*[\d,]+\.\d{2})";

static PROFILES: [BankProfile; 7] = [
    BankProfile {
        bank: Bank::HDFC,
        subject_keywords: &["hdfc"],
        sender_domains: &["hdfcbank.com", "alerts.hdfcbank.net"],
        password_templates: &["{first}{dob}", "{first}{dob_short}", "{first}{phone4}"],
        letterhead_noise: &[r"(?i)Page \d+ of \d+", r"(?i)HDFC\s*BANK\s*LIMITED"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_DAY_MONTH,
    },
    BankProfile {
        bank: Bank::ICICI,
        subject_keywords: &["icici"],
        sender_domains: &["icicibank.com"],
        password_templates: &[
            "{first4}{dob_ddmm}",
            "{first}{dob}",
            "{initials}{phone4}",
            "{bank}{dob_short}",
        ],
        letterhead_noise: &[r"(?i)ICICI\s*BANK\s*LIMITED"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_SLASH_DATE,
    },
    BankProfile {
        bank: Bank::SBI,
        subject_keywords: &["sbi", "state bank"],
        sender_domains: &["sbi.co.in"],
        password_templates: &["{phone5}{dob_ddmmyy}"],
        letterhead_noise: &[r"(?i)STATE\s*BANK\s*OF\s*INDIA", r"(?i)Page \d+ of \d+"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_SLASH_DATE,
    },
    BankProfile {
        bank: Bank::AXIS,
        subject_keywords: &["axis"],
        sender_domains: &["axisbank.com"],
        password_templates: &[],
        letterhead_noise: &[r"(?i)AXIS\s*BANK\s*(?:LTD|LIMITED)"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_SLASH_DATE,
    },
    BankProfile {
        bank: Bank::KOTAK,
        subject_keywords: &["kotak"],
        sender_domains: &["kotak.com"],
        password_templates: &[],
        letterhead_noise: &[r"(?i)KOTAK\s*MAHINDRA\s*BANK"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_SLASH_DATE,
    },
    BankProfile {
        bank: Bank::CANARA,
        subject_keywords: &["canara"],
        sender_domains: &["canarabank.in", "canarabank.com"],
        password_templates: &[],
        letterhead_noise: &[r"(?i)CANARA\s*BANK"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_DAY_MONTH,
    },
    BankProfile {
        bank: Bank::BOB,
        subject_keywords: &["baroda"],
        sender_domains: &["bankofbaroda.in", "bankofbaroda.com"],
        password_templates: &["{first4}{dob_ddmm}"],
        letterhead_noise: &[r"(?i)BANK\s*OF\s*BARODA"],
        fields: COMMON_FIELDS,
        transaction_line: LINE_DAY_MONTH,
    },
];

/// Password templates for a detected bank, falling back to the default list.
pub fn password_templates(bank: Bank) -> &'static [&'static str] {
    match bank.profile() {
        Some(p) if !p.password_templates.is_empty() => p.password_templates,
        _ => DEFAULT_TEMPLATES,
    }
}
