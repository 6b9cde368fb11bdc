//! Password candidate generation. Bank statement passwords in this domain are
//! low-entropy by convention (name/DOB/phone fragments), so a template-driven
//! expansion with a small bounded fan-out beats any brute force. Same inputs
//! always produce the same ordered list, so retries are reproducible and the
//! first match is the preferred password.

use crate::banks;
use crate::credentials::CredentialTokens;
use crate::{credentials, IdentityInput};

/// Last `n` characters of `s`, or all of it when shorter.
fn suffix(s: &str, n: usize) -> &str {
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    let (idx, _) = s.char_indices().nth(count - n).unwrap();
    &s[idx..]
}

/// Uppercase first character, lowercase the rest.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

fn render_template(
    template: &str,
    tokens: &CredentialTokens,
    dob_variant: &str,
    phone_suffix: &str,
) -> String {
    template
        .replace("{first4upper}", &tokens.first4_upper)
        .replace("{first4}", &tokens.first4)
        .replace("{first}", &tokens.first)
        .replace("{last}", &tokens.last)
        .replace("{initials}", &tokens.initials)
        .replace("{dob_ddmmyy}", &tokens.dob_ddmmyy)
        .replace("{dob_ddmm}", &tokens.dob_ddmm)
        .replace("{dob_short}", suffix(dob_variant, 4))
        .replace("{dob}", dob_variant)
        .replace("{phone5}", &tokens.phone5)
        .replace("{phone4}", suffix(phone_suffix, 4))
        .replace("{year}", &tokens.year)
        .replace("{bank}", &tokens.bank_token)
}

/// First-seen-order dedup, empty strings dropped, truncated to `max`.
fn dedup_bounded(candidates: Vec<String>, max: usize) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for c in candidates {
        if out.len() >= max {
            break;
        }
        if !c.is_empty() && seen.insert(c.clone()) {
            out.push(c);
        }
    }
    out
}

/// Generate an ordered, deduplicated candidate list, at most `max_candidates`
/// entries. Templates are selected by bank with a default-list fallback;
/// every rendered candidate is accompanied by its lower, upper and
/// capitalized case variants. Generation stops early once the accumulated
/// pre-dedup count reaches the bound, so the exact final length depends on
/// dedup density.
pub fn generate(
    full_name: &str,
    phone: &str,
    dob: &str,
    bank: &str,
    max_candidates: usize,
) -> Vec<String> {
    let identity = IdentityInput {
        full_name: full_name.to_string(),
        phone: phone.to_string(),
        date_of_birth: dob.to_string(),
        bank_name: bank.to_string(),
    };
    generate_from_tokens(&credentials::normalize(&identity), max_candidates)
}

pub fn generate_from_tokens(tokens: &CredentialTokens, max_candidates: usize) -> Vec<String> {
    let templates = banks::password_templates(tokens.bank);

    let empty = [String::new()];
    let dob_variants: Vec<&String> = if tokens.dob_variants.is_empty() {
        empty.iter().collect()
    } else {
        tokens.dob_variants.iter().collect()
    };
    let phone_suffixes: Vec<&String> = if tokens.phone_suffixes.is_empty() {
        empty.iter().collect()
    } else {
        tokens.phone_suffixes.iter().collect()
    };

    let mut candidates: Vec<String> = Vec::new();
    for template in templates {
        for d in &dob_variants {
            for p in &phone_suffixes {
                let rendered = render_template(template, tokens, d, p);
                if !rendered.is_empty() {
                    candidates.push(rendered.clone());
                    candidates.push(rendered.to_lowercase());
                    candidates.push(rendered.to_uppercase());
                    candidates.push(capitalize(&rendered));
                }
                if candidates.len() >= max_candidates {
                    log::info!(
                        "Candidate generation hit the bound of {} before exhausting templates",
                        max_candidates
                    );
                    return dedup_bounded(candidates, max_candidates);
                }
            }
        }
    }

    // Fallbacks tried only when the template expansion stayed under the bound
    let mut fallback = vec![format!("{}{}", tokens.first, tokens.last)];
    if !tokens.phone.is_empty() {
        fallback.push(format!("{}{}", tokens.first, suffix(&tokens.phone, 4)));
    }
    if !tokens.dob.is_empty() {
        fallback.push(format!("{}{}", tokens.last, suffix(&tokens.dob, 4)));
    }
    for f in fallback {
        if !f.is_empty() {
            candidates.push(f);
        }
    }

    dedup_bounded(candidates, max_candidates)
}
