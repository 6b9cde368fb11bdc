//! Bank identity detection. Precedence reflects signal reliability: an
//! explicit subject keyword beats the sender domain, which beats a free-text
//! content snippet (weakest, a statement may merely mention a competitor).

use crate::banks::Bank;

fn match_keywords(text: &str) -> Option<Bank> {
    let t = text.to_lowercase();
    for bank in Bank::all() {
        let profile = bank.profile()?;
        if profile.subject_keywords.iter().any(|kw| t.contains(kw)) {
            return Some(*bank);
        }
    }
    None
}

fn match_sender(sender: &str) -> Option<Bank> {
    let s = sender.to_lowercase();
    for bank in Bank::all() {
        let profile = bank.profile()?;
        if profile.sender_domains.iter().any(|d| s.contains(d)) {
            return Some(*bank);
        }
    }
    None
}

/// Determine the bank from email subject, sender address and an optional
/// page-content snippet, in that precedence order.
pub fn detect(sender: Option<&str>, subject: Option<&str>, snippet: Option<&str>) -> Bank {
    if let Some(bank) = subject.and_then(match_keywords) {
        log::info!("Bank {} detected from subject line", bank.code());
        return bank;
    }
    if let Some(bank) = sender.and_then(match_sender) {
        log::info!("Bank {} detected from sender address", bank.code());
        return bank;
    }
    if let Some(bank) = snippet.and_then(match_keywords) {
        log::info!("Bank {} detected from content snippet", bank.code());
        return bank;
    }
    Bank::Unknown
}
