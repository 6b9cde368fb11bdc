//! Credential normalization: turns raw user-supplied identity fields into the
//! canonical tokens the password candidate generator expands. Normalization
//! never fails; missing inputs produce empty tokens and empty variant sets.

use std::collections::BTreeSet;

use crate::banks::Bank;
use crate::IdentityInput;

/// Canonical tokens derived from one `IdentityInput`. Variant sets are
/// `BTreeSet`s so iteration order is sorted and candidate generation stays
/// deterministic.
#[derive(Debug, Clone)]
pub struct CredentialTokens {
    pub first: String,
    pub first4: String,
    pub first4_upper: String,
    pub last: String,
    pub initials: String,
    pub phone: String,
    pub dob: String,
    pub year: String,
    pub dob_ddmm: String,
    pub dob_ddmmyy: String,
    pub phone5: String,
    pub dob_variants: BTreeSet<String>,
    pub phone_suffixes: BTreeSet<String>,
    pub bank: Bank,
    /// Raw bank name uppercased, substituted for `{bank}` in templates even
    /// when the name maps to no known bank.
    pub bank_token: String,
}

fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Last `n` characters of `s`, or all of it when shorter.
fn suffix(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let (idx, _) = s.char_indices().nth(count - n).unwrap();
    &s[idx..]
}

pub fn normalize(identity: &IdentityInput) -> CredentialTokens {
    let full_name = identity.full_name.trim();
    let phone = digits_only(&identity.phone);
    let dob = digits_only(&identity.date_of_birth);
    let bank = Bank::normalize(&identity.bank_name);
    let bank_token = identity.bank_name.trim().to_uppercase();

    let parts: Vec<&str> = full_name.split_whitespace().collect();
    let first = parts.first().copied().unwrap_or("").to_string();
    let first4: String = first.chars().take(4).collect();
    let first4_upper = first4.to_uppercase();
    let last = if parts.len() > 1 {
        parts.last().copied().unwrap_or("").to_string()
    } else {
        String::new()
    };
    let initials: String = parts.iter().filter_map(|p| p.chars().next()).collect();

    // dob is digits-only here, e.g. "ddmmyyyy" if the input was "dd-mm-yyyy"
    let year = if dob.len() >= 4 {
        suffix(&dob, 4).to_string()
    } else {
        String::new()
    };
    let year_short = if year.len() == 4 {
        suffix(&year, 2).to_string()
    } else {
        String::new()
    };

    let mut dob_variants = BTreeSet::new();
    if !dob.is_empty() {
        if dob.len() == 8 {
            // ddmmyyyy plus reorderings; the third one is a legacy reordering
            // kept only as a low-priority variant
            dob_variants.insert(dob.clone());
            dob_variants.insert(format!("{}{}{}", &dob[4..8], &dob[2..4], &dob[0..2]));
            dob_variants.insert(format!("{}{}{}", &dob[6..8], &dob[4..6], &dob[0..4]));
            dob_variants.insert(year.clone());
            dob_variants.insert(year_short.clone());
        } else if dob.len() == 6 {
            // ddmmyy
            dob_variants.insert(dob.clone());
            dob_variants.insert(suffix(&dob, 4).to_string());
        } else {
            dob_variants.insert(dob.clone());
            if !year.is_empty() {
                dob_variants.insert(year.clone());
            }
        }
        dob_variants.remove("");
    }

    let mut phone_suffixes = BTreeSet::new();
    let mut phone5 = String::new();
    if !phone.is_empty() {
        phone_suffixes.insert(suffix(&phone, 4).to_string());
        phone_suffixes.insert(suffix(&phone, 6).to_string());
        phone_suffixes.insert(phone.clone());
        phone5 = suffix(&phone, 5).to_string();
        phone_suffixes.insert(phone5.clone());
    }

    // day+month+short-year, reconstructed positionally from the original length
    let dob_ddmmyy = if dob.is_empty() {
        String::new()
    } else if dob.len() == 8 {
        format!("{}{}", &dob[0..4], &dob[6..8])
    } else if dob.len() == 6 {
        dob.clone()
    } else {
        suffix(&dob, 6).to_string()
    };

    // day+month only, for templates that need exactly that shape
    let dob_ddmm = if dob.len() >= 4 {
        dob[0..4].to_string()
    } else {
        dob.clone()
    };

    CredentialTokens {
        first,
        first4,
        first4_upper,
        last,
        initials,
        phone,
        dob,
        year,
        dob_ddmm,
        dob_ddmmyy,
        phone5,
        dob_variants,
        phone_suffixes,
        bank,
        bank_token,
    }
}
