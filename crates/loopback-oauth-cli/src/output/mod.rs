//! Output formatting utilities

use crate::error::Result;
use console::style;
use loopback_oauth::TokenSet;
use serde::Serialize;

/// Characters of a token shown before it is cut off
const TOKEN_PREVIEW_CHARS: usize = 16;

/// Output data as JSON
pub fn json_output<T: Serialize>(data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)?;
    println!("{json}");
    Ok(())
}

/// Print a success message with green checkmark
pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an informational message with blue info icon
pub fn print_info(message: &str) {
    println!("{} {}", style("ℹ").blue(), message);
}

/// Print a link/URL with label
pub fn print_link(label: &str, url: &str) {
    println!("{} {}: {}", style("→").cyan(), label, style(url).dim());
}

/// Shorten a token for display
pub fn truncate_token(token: &str) -> String {
    if token.chars().count() <= TOKEN_PREVIEW_CHARS {
        return token.to_string();
    }
    let preview: String = token.chars().take(TOKEN_PREVIEW_CHARS).collect();
    format!("{}…", preview)
}

/// Human-readable summary of a token set, one field per line
pub fn token_summary(tokens: &TokenSet) -> Vec<(&'static str, String)> {
    let mut lines = Vec::new();
    let fields = [
        ("Access token", &tokens.access_token),
        ("ID token", &tokens.id_token),
        ("Refresh token", &tokens.refresh_token),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            lines.push((label, truncate_token(value)));
        }
    }
    if let Some(token_type) = &tokens.token_type {
        lines.push(("Token type", token_type.clone()));
    }
    if tokens.expires_in > 0 {
        lines.push(("Expires in", format!("{}s", tokens.expires_in)));
    }
    lines
}

pub fn print_token_summary(tokens: &TokenSet) {
    for (label, value) in token_summary(tokens) {
        println!("  {:<14} {}", style(format!("{}:", label)).bold(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_token() {
        assert_eq!(truncate_token("short"), "short");
        assert_eq!(
            truncate_token("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9"),
            "eyJhbGciOiJSUzI1…"
        );
        // multi-byte characters are never split
        assert_eq!(truncate_token(&"é".repeat(20)), format!("{}…", "é".repeat(16)));
    }

    #[test]
    fn test_token_summary_skips_missing_fields() {
        let tokens = TokenSet {
            access_token: Some("at".into()),
            refresh_token: Some("rt".into()),
            expires_in: 3600,
            ..TokenSet::default()
        };
        assert_eq!(
            token_summary(&tokens),
            vec![
                ("Access token", "at".to_string()),
                ("Refresh token", "rt".to_string()),
                ("Expires in", "3600s".to_string()),
            ]
        );
        assert!(token_summary(&TokenSet::default()).is_empty());
    }
}
