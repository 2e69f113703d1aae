//! Offline text rewriter used by the terminal frontend

use async_trait::async_trait;
use dossier::error::ServiceError;
use dossier::services::{RewriteRequest, TextRewriter};

/// Normalizes whitespace and sentence capitalization without calling out
/// to a remote model
pub struct TidyRewriter;

#[async_trait]
impl TextRewriter for TidyRewriter {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ServiceError> {
        let text = tidy(&request.text);
        if text.is_empty() {
            return Err(ServiceError::new("rewrite/failed", "nothing to rewrite"));
        }
        Ok(text)
    }
}

/// Collapse runs of spaces, drop blank lines and capitalize sentences
pub fn tidy(text: &str) -> String {
    let paragraphs: Vec<String> = text
        .lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .map(|line| capitalize_sentences(&line))
        .collect();
    paragraphs.join("\n")
}

fn capitalize_sentences(line: &str) -> String {
    let mut out = String::with_capacity(line.len() + 1);
    let mut at_start = true;
    for c in line.chars() {
        if at_start && c.is_alphabetic() {
            out.extend(c.to_uppercase());
            at_start = false;
        } else {
            out.push(c);
            if matches!(c, '.' | '!' | '?') {
                at_start = true;
            }
        }
    }
    if !out.ends_with(['.', '!', '?']) {
        out.push('.');
    }
    out
}
