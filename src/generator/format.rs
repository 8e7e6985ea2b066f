use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::fmt;

use super::GeneratorError;
use crate::schema::{ObjectType, PropertySchema};

/// Width generated doc comment text wraps at.
pub const DOC_WIDTH: usize = 100;

/// The type of a property as it reads in documentation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeName {
    /// `bool`, `int`, `str`, or the schema type passed through (`number`, ...)
    Primitive(String),
    /// A list of primitives (`items: {type: ...}`)
    PrimitiveList(String),
    /// A single reference to another resource's model (`allOf` / `$ref`)
    Reference(String),
    /// A list of references (`items: {$ref: ...}`)
    ReferenceList(String),
}

impl TypeName {
    pub fn name(&self) -> &str {
        match self {
            TypeName::Primitive(n)
            | TypeName::PrimitiveList(n)
            | TypeName::Reference(n)
            | TypeName::ReferenceList(n) => n,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeName::Reference(_) | TypeName::ReferenceList(_))
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn primitive_name(schema_type: &str) -> String {
    match schema_type {
        "boolean" => "bool",
        "integer" => "int",
        "string" => "str",
        other => other,
    }
    .to_string()
}

/// `#/definitions/TagsModel` → `Tags`
fn referenced_name(reference: &str) -> Option<String> {
    let last = reference.rsplit('/').next()?;
    let name = last.strip_suffix("Model").unwrap_or(last);
    (!name.is_empty()).then(|| name.to_string())
}

/// Resolve the documentation type of a property.
///
/// Exactly one of a direct `type`, an `allOf` reference or an `items`
/// definition is expected. A `type: array` carrying `items` is read through
/// its `items`.
///
/// # Errors
///
/// Returns [`GeneratorError::SchemaShape`] when none of the forms match.
pub fn format_type(
    resource: ObjectType,
    property: &PropertySchema,
) -> Result<TypeName, GeneratorError> {
    let raw = &property.raw;
    let items = raw.get("items").filter(|i| !i.is_null());

    match raw.get("type").and_then(Value::as_str) {
        Some("array") if items.is_some() => {}
        Some(t) => return Ok(TypeName::Primitive(primitive_name(t))),
        None => {}
    }

    if let Some(name) = raw
        .get("allOf")
        .and_then(Value::as_array)
        .and_then(|all_of| all_of.first())
        .and_then(|first| first.get("$ref"))
        .or_else(|| raw.get("$ref"))
        .and_then(Value::as_str)
        .and_then(referenced_name)
    {
        return Ok(TypeName::Reference(name));
    }

    if let Some(items) = items {
        if let Some(name) = items
            .get("$ref")
            .and_then(Value::as_str)
            .and_then(referenced_name)
        {
            return Ok(TypeName::ReferenceList(name));
        }
        if let Some(t) = items.get("type").and_then(Value::as_str) {
            return Ok(TypeName::PrimitiveList(primitive_name(t)));
        }
    }

    Err(GeneratorError::SchemaShape {
        resource,
        property: Some(property.name.clone()),
        raw: raw.clone(),
    })
}

/// Rust type generated models use for a documentation primitive.
pub fn rust_primitive(name: &str) -> &'static str {
    match name {
        "bool" => "bool",
        "int" => "i64",
        "str" => "String",
        "number" => "f64",
        _ => "serde_json::Value",
    }
}

/// Terminate the text with punctuation and capitalize its first word.
pub fn normalize_description(text: &str) -> String {
    let text = text.trim();
    let Some(last) = text.chars().last() else {
        return String::new();
    };
    let mut out = String::with_capacity(text.len() + 1);
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        out.extend(first.to_uppercase());
        out.push_str(chars.as_str());
    }
    if !matches!(last, '.' | '?' | '!') {
        out.push('.');
    }
    out
}

/// Greedy word wrap.
///
/// Line length includes the indent. Leading whitespace of the text is kept on
/// the first line; every following line starts with `indent`. Words longer
/// than `width` get a line of their own and are never broken.
pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let leading: String = text.chars().take_while(|c| c.is_whitespace()).collect();
    let indent_len = indent.chars().count();

    let mut lines = Vec::new();
    let mut current = leading;
    let mut current_len = current.chars().count();
    let mut words_on_line = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        if words_on_line > 0 && current_len + 1 + word_len > width {
            lines.push(std::mem::take(&mut current));
            current.push_str(indent);
            current_len = indent_len;
            words_on_line = 0;
        }
        if words_on_line > 0 {
            current.push(' ');
            current_len += 1;
        }
        current.push_str(word);
        current_len += word_len;
        words_on_line += 1;
    }
    if words_on_line > 0 {
        lines.push(current);
    }
    lines.join("\n")
}

/// Normalize then wrap a description.
pub fn format_description(text: &str, width: usize, indent: &str) -> String {
    wrap_text(&normalize_description(text), width, indent)
}

/// Prefix every line of a block with `prefix`, trimming trailing spaces.
pub fn prefix_lines(block: &str, prefix: &str) -> String {
    block
        .lines()
        .map(|l| format!("{prefix}{l}").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

static ACRONYM_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Z]+)([A-Z][a-z])").expect("valid regex"));
static WORD_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z0-9])([A-Z])").expect("valid regex"));

/// `dateAdded` → `date_added`, `hasTag` → `has_tag`
pub fn snake_case(s: &str) -> String {
    let s = ACRONYM_BOUNDARY.replace_all(s, "${1}_${2}");
    let s = WORD_BOUNDARY.replace_all(&s, "${1}_${2}");
    s.replace(['-', ' '], "_").to_lowercase()
}

/// `victim_assets` → `VictimAssets`
pub fn camel_case(s: &str) -> String {
    s.split('_')
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}

/// `date_added` → `dateAdded`
pub fn lower_camel_case(s: &str) -> String {
    let camel = camel_case(s);
    let mut chars = camel.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Make a name usable as a Rust identifier.
pub fn rust_identifier(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "break", "const", "continue", "else", "enum", "extern", "false", "fn", "for", "if",
        "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub", "ref", "return",
        "static", "struct", "trait", "true", "type", "unsafe", "use", "where", "while", "async",
        "await", "dyn",
    ];
    const NOT_RAW: &[&str] = &["crate", "self", "Self", "super"];

    let mut s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if s.is_empty() {
        s.push('_');
    }
    if s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }
    if KEYWORDS.contains(&s.as_str()) {
        format!("r#{s}")
    } else if NOT_RAW.contains(&s.as_str()) {
        format!("{s}_")
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prop(raw: serde_json::Value) -> PropertySchema {
        PropertySchema::from_value("field", &raw)
    }

    #[test]
    fn maps_primitive_types() {
        let t = |raw| format_type(ObjectType::Tags, &prop(raw)).unwrap();
        assert_eq!(t(json!({"type": "boolean"})), TypeName::Primitive("bool".into()));
        assert_eq!(t(json!({"type": "integer"})), TypeName::Primitive("int".into()));
        assert_eq!(t(json!({"type": "string"})), TypeName::Primitive("str".into()));
        assert_eq!(t(json!({"type": "number"})), TypeName::Primitive("number".into()));
    }

    #[test]
    fn resolves_references() {
        let t = |raw| format_type(ObjectType::Indicators, &prop(raw)).unwrap();
        assert_eq!(
            t(json!({"allOf": [{"$ref": "#/definitions/TagsModel"}]})),
            TypeName::Reference("Tags".into())
        );
        assert_eq!(
            t(json!({"type": "array", "items": {"$ref": "#/definitions/GroupModel"}})),
            TypeName::ReferenceList("Group".into())
        );
        assert_eq!(
            t(json!({"items": {"type": "string"}})),
            TypeName::PrimitiveList("str".into())
        );
    }

    #[test]
    fn unresolvable_property_is_a_shape_error() {
        let err = format_type(ObjectType::Indicators, &prop(json!({"description": "?"})))
            .unwrap_err();
        match err {
            GeneratorError::SchemaShape { property, raw, .. } => {
                assert_eq!(property.as_deref(), Some("field"));
                assert_eq!(raw, json!({"description": "?"}));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn normalizes_punctuation_and_capitalization() {
        assert_eq!(normalize_description("the ID of the item"), "The ID of the item.");
        assert_eq!(normalize_description("Is the indicator active?"), "Is the indicator active?");
        assert_eq!(normalize_description(""), "");
    }

    #[test]
    fn wraps_within_width_with_hanging_indent() {
        let text = "The date and time that the Attribute was first created and then modified again later on.";
        let out = format_description(text, 30, "    ");
        let lines: Vec<_> = out.lines().collect();
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.chars().count() <= 30));
        assert!(lines[1..].iter().all(|l| l.starts_with("    ")));
        assert_eq!(
            out.split_whitespace().collect::<Vec<_>>(),
            text.split_whitespace().collect::<Vec<_>>()
        );
    }

    #[test]
    fn keeps_leading_whitespace_and_long_words() {
        let out = wrap_text("  averyveryverylongword short", 10, "  ");
        assert_eq!(out, "  averyveryverylongword\n  short");
    }

    #[test]
    fn case_helpers() {
        assert_eq!(snake_case("dateAdded"), "date_added");
        assert_eq!(snake_case("hasTag"), "has_tag");
        assert_eq!(snake_case("XMLHttpRequest"), "xml_http_request");
        assert_eq!(camel_case("victim_assets"), "VictimAssets");
        assert_eq!(lower_camel_case("date_added"), "dateAdded");
        assert_eq!(rust_identifier("type"), "r#type");
        assert_eq!(rust_identifier("self"), "self_");
        assert_eq!(rust_identifier("1st"), "_1st");
    }
}
