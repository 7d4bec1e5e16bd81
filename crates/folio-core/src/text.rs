/// Content tag a highlighter assigns to a piece of source text.
///
/// Kinds carry no color; styles are looked up per color mode when the code is displayed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TokenKind {
    #[default]
    Plain,
    Comment,
    String,
    Number,
    Boolean,
    Constant,
    Builtin,
    Function,
    ClassName,
    Keyword,
    Operator,
    Punctuation,
    Variable,
    Property,
    Tag,
    AttrName,
    Namespace,
    Inserted,
    Deleted,
}

impl TokenKind {
    /// CSS-like class for the token, e.g. `token keyword`.
    pub fn class_name(self) -> &'static str {
        match self {
            TokenKind::Plain => "token plain",
            TokenKind::Comment => "token comment",
            TokenKind::String => "token string",
            TokenKind::Number => "token number",
            TokenKind::Boolean => "token boolean",
            TokenKind::Constant => "token constant",
            TokenKind::Builtin => "token builtin",
            TokenKind::Function => "token function",
            TokenKind::ClassName => "token class-name",
            TokenKind::Keyword => "token keyword",
            TokenKind::Operator => "token operator",
            TokenKind::Punctuation => "token punctuation",
            TokenKind::Variable => "token variable",
            TokenKind::Property => "token property",
            TokenKind::Tag => "token tag",
            TokenKind::AttrName => "token attr-name",
            TokenKind::Namespace => "token namespace",
            TokenKind::Inserted => "token inserted",
            TokenKind::Deleted => "token deleted",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub content: String,
    pub kind: TokenKind,
}

impl Token {
    pub fn new(content: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            content: content.into(),
            kind,
        }
    }

    pub fn plain(content: impl Into<String>) -> Self {
        Self::new(content, TokenKind::Plain)
    }
}

/// Tokenizes source text for display.
///
/// Implementations must return exactly one entry per input line, in order, and must not
/// reorder tokens within a line.
pub trait CodeHighlighter {
    fn tokenize_lines(&self, language: Option<&str>, lines: &[&str]) -> Vec<Vec<Token>>;

    /// Tokenizes a whole text. Splits on `\n`, so a trailing newline yields a trailing empty line.
    fn tokenize_text(&self, language: Option<&str>, text: &str) -> Vec<Vec<Token>> {
        let lines: Vec<&str> = text.split('\n').collect();
        self.tokenize_lines(language, &lines)
    }

    /// Class name of the rendered block, e.g. `language-python`.
    fn class_name(&self, language: Option<&str>) -> String {
        format!("language-{}", language.unwrap_or("none"))
    }

    /// Blocks in a language this returns `false` for are rendered as plain text.
    fn supports_language(&self, _language: &str) -> bool {
        true
    }
}

/// Treats every line as a single plain token.
pub struct NoHighlight;

impl CodeHighlighter for NoHighlight {
    fn tokenize_lines(&self, _language: Option<&str>, lines: &[&str]) -> Vec<Vec<Token>> {
        lines
            .iter()
            .map(|l| {
                if l.is_empty() {
                    Vec::new()
                } else {
                    vec![Token::plain(*l)]
                }
            })
            .collect()
    }
}

/// Drops empty tokens and joins neighbours of the same kind.
pub fn merge_adjacent(tokens: Vec<Token>) -> Vec<Token> {
    let mut out: Vec<Token> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if token.content.is_empty() {
            continue;
        }
        match out.last_mut() {
            Some(last) if last.kind == token.kind => last.content.push_str(&token.content),
            _ => out.push(token),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_highlight_keeps_trailing_empty_line() {
        let lines = NoHighlight.tokenize_text(Some("python"), "a\nb\n");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], vec![Token::plain("a")]);
        assert!(lines[2].is_empty());
    }

    #[test]
    fn merges_same_kind_neighbours() {
        let merged = merge_adjacent(vec![
            Token::new("fn", TokenKind::Keyword),
            Token::plain(""),
            Token::plain(" "),
            Token::plain("main"),
            Token::new("(", TokenKind::Punctuation),
        ]);
        assert_eq!(
            merged,
            vec![
                Token::new("fn", TokenKind::Keyword),
                Token::plain(" main"),
                Token::new("(", TokenKind::Punctuation),
            ]
        );
    }
}
