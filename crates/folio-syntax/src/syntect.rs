use folio_core::text::CodeHighlighter;
use folio_core::text::Token;
use folio_core::text::merge_adjacent;
use syntect::parsing::ParseState;
use syntect::parsing::ScopeStack;
use syntect::parsing::SyntaxReference;
use syntect::parsing::SyntaxSet;

use crate::scope::classify_stack;

/// Language names used in fenced blocks that syntect knows under another token.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("shell", "bash"),
    ("zsh", "bash"),
    ("console", "bash"),
    ("jsx", "js"),
    ("yml", "yaml"),
];

pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntectHighlighter {
    pub fn new() -> Self {
        Self::with_syntax_set(SyntaxSet::load_defaults_newlines())
    }

    /// Uses a custom syntax set. The set must be built for newline-terminated lines.
    pub fn with_syntax_set(syntax_set: SyntaxSet) -> Self {
        Self { syntax_set }
    }

    fn find_syntax(&self, language: &str) -> Option<&SyntaxReference> {
        let lang = language.trim().to_ascii_lowercase();
        let lang = LANGUAGE_ALIASES
            .iter()
            .find(|(alias, _)| *alias == lang)
            .map_or(lang.as_str(), |(_, target)| target);
        self.syntax_set
            .find_syntax_by_extension(lang)
            .or_else(|| self.syntax_set.find_syntax_by_token(lang))
    }

    fn syntax_for(&self, language: Option<&str>) -> &SyntaxReference {
        language
            .and_then(|lang| self.find_syntax(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    fn tokenize_line(&self, state: &mut ParseState, stack: &mut ScopeStack, line: &str) -> Vec<Token> {
        let terminated = format!("{line}\n");
        let ops = match state.parse_line(&terminated, &self.syntax_set) {
            Ok(ops) => ops,
            Err(err) => {
                tracing::warn!(%err, "syntect failed to parse line, emitting plain text");
                return if line.is_empty() {
                    Vec::new()
                } else {
                    vec![Token::plain(line)]
                };
            }
        };

        let mut tokens = Vec::new();
        let mut start = 0usize;
        for (offset, op) in ops {
            let end = offset.min(line.len());
            if end > start {
                tokens.push(Token::new(&line[start..end], current_kind(stack)));
                start = end;
            }
            if let Err(err) = stack.apply(&op) {
                tracing::warn!(?err, "invalid scope operation");
            }
        }
        if start < line.len() {
            tokens.push(Token::new(&line[start..], current_kind(stack)));
        }
        merge_adjacent(tokens)
    }
}

fn current_kind(stack: &ScopeStack) -> folio_core::text::TokenKind {
    let names: Vec<String> = stack.as_slice().iter().map(|s| s.build_string()).collect();
    classify_stack(names.iter().map(String::as_str))
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeHighlighter for SyntectHighlighter {
    fn tokenize_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Token>> {
        let syntax = self.syntax_for(language);
        tracing::debug!(syntax = %syntax.name, lines = lines.len(), "tokenizing code block");
        let mut state = ParseState::new(syntax);
        let mut stack = ScopeStack::new();
        lines
            .iter()
            .map(|line| self.tokenize_line(&mut state, &mut stack, line))
            .collect()
    }

    fn supports_language(&self, language: &str) -> bool {
        self.find_syntax(language).is_some()
    }
}
