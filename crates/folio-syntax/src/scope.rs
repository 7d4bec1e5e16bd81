use folio_core::text::TokenKind;

/// Maps a TextMate scope name to a token kind, or `None` when the scope carries no meaning
/// for display (e.g. `source.python`, `meta.*`).
pub fn classify_scope(scope: &str) -> Option<TokenKind> {
    let s = scope;
    if s.starts_with("comment") || s.starts_with("punctuation.definition.comment") {
        return Some(TokenKind::Comment);
    }
    if s.starts_with("string") || s.starts_with("punctuation.definition.string") {
        return Some(TokenKind::String);
    }
    if s.starts_with("constant.numeric") {
        return Some(TokenKind::Number);
    }
    if s.starts_with("constant.language.boolean") {
        return Some(TokenKind::Boolean);
    }
    if s.starts_with("constant") || s.starts_with("support.constant") {
        return Some(TokenKind::Constant);
    }
    if s.starts_with("keyword.operator") {
        return Some(TokenKind::Operator);
    }
    if s.starts_with("keyword") || s.starts_with("storage") {
        return Some(TokenKind::Keyword);
    }
    if s.starts_with("entity.name.function")
        || s.starts_with("support.function")
        || s.starts_with("variable.function")
    {
        return Some(TokenKind::Function);
    }
    if s.starts_with("entity.name.type")
        || s.starts_with("entity.name.class")
        || s.starts_with("entity.other.inherited-class")
        || s.starts_with("support.type")
        || s.starts_with("support.class")
    {
        return Some(TokenKind::ClassName);
    }
    if s.starts_with("entity.name.namespace") || s.starts_with("entity.name.module") {
        return Some(TokenKind::Namespace);
    }
    if s.starts_with("entity.name.tag") {
        return Some(TokenKind::Tag);
    }
    if s.starts_with("entity.other.attribute-name") {
        return Some(TokenKind::AttrName);
    }
    if s.starts_with("support.other.property")
        || s.starts_with("meta.object-literal.key")
        || s.starts_with("variable.other.member")
        || s.starts_with("variable.other.property")
    {
        return Some(TokenKind::Property);
    }
    if s.starts_with("variable.language") || s.starts_with("support.variable") {
        return Some(TokenKind::Builtin);
    }
    if s.starts_with("variable") {
        return Some(TokenKind::Variable);
    }
    if s.starts_with("markup.inserted") {
        return Some(TokenKind::Inserted);
    }
    if s.starts_with("markup.deleted") {
        return Some(TokenKind::Deleted);
    }
    if s.starts_with("punctuation") {
        return Some(TokenKind::Punctuation);
    }
    None
}

/// Classifies a scope stack, innermost scope first. Unclassified stacks are plain text.
pub fn classify_stack<'a>(scopes: impl DoubleEndedIterator<Item = &'a str>) -> TokenKind {
    scopes.rev().find_map(classify_scope).unwrap_or(TokenKind::Plain)
}
