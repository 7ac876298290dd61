/// Personal-email providers. Their domains never anchor a company org.
pub const GENERIC_EMAIL_DOMAINS: [&str; 10] = [
    "gmail.com",
    "yahoo.com",
    "yahoo.co.in",
    "outlook.com",
    "hotmail.com",
    "live.com",
    "icloud.com",
    "protonmail.com",
    "zoho.com",
    "rediffmail.com",
];

/// Text after the last `@`, trimmed and lower-cased.
pub fn split_email_domain(email: &str) -> String {
    email.rsplit('@').next().unwrap_or_default().trim().to_lowercase()
}

pub fn is_generic_email_domain(domain: &str) -> bool {
    GENERIC_EMAIL_DOMAINS.contains(&domain)
}
