pub mod cache;
pub mod config;
pub mod error;
pub mod http;

/// Python-style capitalization: first character upper-cased, the rest lower-cased.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
