//! Request parameters
//!
//! A `ParamBuilder` is a list of sources read from the document right
//! before each request. Sources that cannot find their element contribute
//! nothing; building never fails.

use std::fmt;

use glance_dom::{Document, NodeId, Selector};
use serde::{Deserialize, Serialize};

use crate::pagination::{Pagination, PaginationFields};

/// A parameter value
///
/// Text that looks like a decimal number is stored as a number, so `"10"`
/// and `10` produce the same request. Numbers too long to survive the trip
/// through `f64` stay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Number(f64),
    Text(String),
}

impl ParamValue {
    /// Text value, coerced to a number when it looks like one
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into()).coerce()
    }

    pub fn number(value: f64) -> Self {
        Self::Number(value)
    }

    /// Coerce numeric-looking text; numbers and other text pass through
    pub fn coerce(self) -> Self {
        match self {
            Self::Text(text) => match parse_numeric(&text) {
                Some(n) => Self::Number(n),
                None => Self::Text(text),
            },
            number => number,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    /// Wire form of the value
    pub fn to_query_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<u64> for ParamValue {
    fn from(value: u64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

const MAX_EXACT_DIGITS: usize = 15;

/// Optional sign, digits, optional fraction
fn parse_numeric(text: &str) -> Option<f64> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix(['-', '+']).unwrap_or(trimmed);
    let (whole, fraction) = match unsigned.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (unsigned, None),
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !digits(whole) || fraction.is_some_and(|f| !digits(f)) {
        return None;
    }
    // Beyond 15 significant digits an f64 no longer reproduces the text
    let all_digits = format!("{whole}{}", fraction.unwrap_or(""));
    if all_digits.trim_start_matches('0').trim_end_matches('0').len() > MAX_EXACT_DIGITS {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Ordered key-value list; inserting an existing key replaces its value
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        let key = key.into();
        let value = value.into().coerce();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Merge another list into this one; later values win
    pub fn extend(&mut self, other: Params) {
        for (key, value) in other.entries {
            self.insert(key, value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// String pairs ready for url encoding
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.to_query_value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

type CustomSource = Box<dyn Fn(&Document) -> Params>;

/// Where one or more parameters come from
pub enum ParamSource {
    /// Value of the form control (or text of the element) with this id
    Field { key: String, element_id: String },
    /// A fixed value
    Constant { key: String, value: ParamValue },
    /// `start`, `perPage`, `page` from pagination hidden inputs
    Pagination(PaginationFields),
    /// Id of the tab carrying `class` inside `container_id`
    CurrentTab {
        key: String,
        container_id: String,
        class: String,
    },
    /// Every named, successful control of a form
    Form { form_id: String },
    /// Anything else
    Custom(CustomSource),
}

impl fmt::Debug for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field { key, element_id } => write!(f, "Field({key} <- #{element_id})"),
            Self::Constant { key, value } => write!(f, "Constant({key} = {value})"),
            Self::Pagination(fields) => write!(f, "Pagination({fields:?})"),
            Self::CurrentTab { key, container_id, class } => {
                write!(f, "CurrentTab({key} <- #{container_id} .{class})")
            }
            Self::Form { form_id } => write!(f, "Form(#{form_id})"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl ParamSource {
    fn collect(&self, doc: &Document, out: &mut Params) {
        match self {
            Self::Field { key, element_id } => {
                if let Some(value) = doc.get_element_by_id(element_id).and_then(|n| field_value(doc, n)) {
                    out.insert(key.clone(), value);
                }
            }
            Self::Constant { key, value } => out.insert(key.clone(), value.clone()),
            Self::Pagination(fields) => {
                if let Some(pagination) = Pagination::from_document(doc, fields) {
                    out.insert("start", pagination.start);
                    out.insert("perPage", pagination.per_page);
                    out.insert("page", pagination.current_page());
                }
            }
            Self::CurrentTab { key, container_id, class } => {
                if let Some(tab) = current_tab(doc, container_id, class) {
                    out.insert(key.clone(), tab);
                }
            }
            Self::Form { form_id } => {
                if let Some(form) = doc.get_element_by_id(form_id) {
                    out.extend(form_params(doc, form));
                }
            }
            Self::Custom(source) => out.extend(source(doc)),
        }
    }
}

fn field_value(doc: &Document, node: NodeId) -> Option<String> {
    let tree = doc.tree();
    let elem = tree.element(node)?;
    match elem.control_kind() {
        Some(kind) if kind.is_checkable() => Some(tree.is_checked(node).to_string()),
        Some(_) => tree.control_value(node),
        None => Some(tree.text_content(node).trim().to_string()),
    }
}

/// Id of the element under `container_id` carrying `class`
///
/// A `data-tab` attribute on the tab overrides its id.
pub fn current_tab(doc: &Document, container_id: &str, class: &str) -> Option<String> {
    let container = doc.get_element_by_id(container_id)?;
    let tree = doc.tree();
    let tab = tree.query_first(container, &Selector::class(class))?;
    let elem = tree.element(tab)?;
    elem.get_attr("data-tab")
        .or_else(|| elem.id())
        .map(str::to_string)
}

/// Named controls of a form the way a browser would submit them
pub fn form_params(doc: &Document, form: NodeId) -> Params {
    let tree = doc.tree();
    let mut params = Params::new();
    for (node, data) in tree.descendants(form) {
        let Some(elem) = data.as_element() else {
            continue;
        };
        let (Some(kind), Some(name)) = (elem.control_kind(), elem.name()) else {
            continue;
        };
        if elem.get_attr("disabled").is_some() {
            continue;
        }
        if kind.is_checkable() && !elem.is_checked() {
            continue;
        }
        if let Some(value) = tree.control_value(node) {
            params.insert(name.to_string(), value);
        }
    }
    params
}

/// Reads request parameters out of the document
#[derive(Debug, Default)]
pub struct ParamBuilder {
    sources: Vec<ParamSource>,
}

impl ParamBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source(mut self, source: ParamSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn field(self, key: &str, element_id: &str) -> Self {
        self.source(ParamSource::Field {
            key: key.to_string(),
            element_id: element_id.to_string(),
        })
    }

    pub fn constant(self, key: &str, value: impl Into<ParamValue>) -> Self {
        self.source(ParamSource::Constant {
            key: key.to_string(),
            value: value.into(),
        })
    }

    pub fn pagination(self, fields: PaginationFields) -> Self {
        self.source(ParamSource::Pagination(fields))
    }

    pub fn current_tab(self, key: &str, container_id: &str, class: &str) -> Self {
        self.source(ParamSource::CurrentTab {
            key: key.to_string(),
            container_id: container_id.to_string(),
            class: class.to_string(),
        })
    }

    pub fn form(self, form_id: &str) -> Self {
        self.source(ParamSource::Form {
            form_id: form_id.to_string(),
        })
    }

    pub fn custom<F>(self, f: F) -> Self
    where
        F: Fn(&Document) -> Params + 'static,
    {
        self.source(ParamSource::Custom(Box::new(f)))
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Read every source; later sources override earlier keys
    pub fn build(&self, doc: &Document) -> Params {
        let mut params = Params::new();
        for source in &self.sources {
            source.collect(doc, &mut params);
        }
        tracing::trace!("built {} request params", params.len());
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glance_html::set_inner_html;

    fn page(html: &str) -> Document {
        let mut doc = Document::default();
        let body = doc.body();
        let root = doc.append_element(body, "div", Some("root")).unwrap();
        set_inner_html(&mut doc, root, html).unwrap();
        doc
    }

    #[test]
    fn test_coercion() {
        assert_eq!(ParamValue::text("10"), ParamValue::Number(10.0));
        assert_eq!(ParamValue::text("-2.5"), ParamValue::Number(-2.5));
        assert_eq!(ParamValue::text(" 7 "), ParamValue::Number(7.0));
        assert_eq!(ParamValue::text("abc"), ParamValue::Text("abc".into()));
        assert_eq!(ParamValue::text("1e3"), ParamValue::Text("1e3".into()));
        assert_eq!(ParamValue::text("1."), ParamValue::Text("1.".into()));
        assert_eq!(ParamValue::text(""), ParamValue::Text(String::new()));
        assert_eq!(ParamValue::text("NaN"), ParamValue::Text("NaN".into()));
    }

    #[test]
    fn test_coercion_idempotent() {
        for raw in ["10", "abc", "3.25", "", "-0", "x1"] {
            let once = ParamValue::text(raw);
            assert_eq!(once.clone().coerce(), once);
        }
    }

    #[test]
    fn test_long_numbers_keep_their_digits() {
        let big = ParamValue::text("12345678901234567890");
        assert_eq!(big, ParamValue::Text("12345678901234567890".into()));
        assert_eq!(big.to_query_value(), "12345678901234567890");
        assert_eq!(ParamValue::text("0.1234567890123456789").to_query_value(), "0.1234567890123456789");

        assert_eq!(ParamValue::text("123456789012345"), ParamValue::Number(123456789012345.0));
        let round = ParamValue::text("1000000000000000000");
        assert_eq!(round.as_number(), Some(1e18));
        assert_eq!(round.to_query_value(), "1000000000000000000");
    }

    #[test]
    fn test_query_formatting() {
        assert_eq!(ParamValue::Number(10.0).to_query_value(), "10");
        assert_eq!(ParamValue::Number(2.5).to_query_value(), "2.5");
        assert_eq!(ParamValue::text("build").to_query_value(), "build");
    }

    #[test]
    fn test_params_replace_keeps_position() {
        let params = Params::new().with("a", "1").with("b", "x").with("a", "2");
        assert_eq!(
            params.to_pairs(),
            vec![("a".to_string(), "2".to_string()), ("b".to_string(), "x".to_string())]
        );
    }

    #[test]
    fn test_field_source() {
        let doc = page(r#"<input id="filter" value="deploy"><span id="label"> 12 </span>"#);
        let params = ParamBuilder::new()
            .field("q", "filter")
            .field("n", "label")
            .field("missing", "nope")
            .build(&doc);
        assert_eq!(params.get("q"), Some(&ParamValue::Text("deploy".into())));
        assert_eq!(params.get("n"), Some(&ParamValue::Number(12.0)));
        assert!(params.get("missing").is_none());
    }

    #[test]
    fn test_checkbox_field_reports_checkedness() {
        let doc = page(r#"<input type="checkbox" id="mine" checked>"#);
        let params = ParamBuilder::new().field("mine", "mine").build(&doc);
        assert_eq!(params.get("mine"), Some(&ParamValue::Text("true".into())));
    }

    #[test]
    fn test_pagination_source() {
        let doc = page(
            r#"<input type="hidden" id="start" value="20">
               <input type="hidden" id="per_page" value="10">
               <input type="hidden" id="count" value="55">"#,
        );
        let params = ParamBuilder::new()
            .pagination(PaginationFields::new("start", "per_page", "count"))
            .build(&doc);
        assert_eq!(params.get("start"), Some(&ParamValue::Number(20.0)));
        assert_eq!(params.get("perPage"), Some(&ParamValue::Number(10.0)));
        assert_eq!(params.get("page"), Some(&ParamValue::Number(3.0)));
    }

    #[test]
    fn test_current_tab_source() {
        let doc = page(
            r#"<ul id="tabs"><li id="tab_all"></li><li id="tab_mine" class="current"></li></ul>"#,
        );
        let params = ParamBuilder::new().current_tab("tab", "tabs", "current").build(&doc);
        assert_eq!(params.get("tab"), Some(&ParamValue::Text("tab_mine".into())));
    }

    #[test]
    fn test_form_source() {
        let doc = page(
            r#"<form id="filters">
                 <input name="q" value="api">
                 <input type="checkbox" name="failed" value="1" checked>
                 <input type="checkbox" name="passed" value="1">
                 <input name="off" value="x" disabled>
                 <select name="branch"><option>main</option><option selected>dev</option></select>
               </form>"#,
        );
        let params = ParamBuilder::new().form("filters").build(&doc);
        let keys: Vec<_> = params.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["q", "failed", "branch"]);
        assert_eq!(params.get("branch"), Some(&ParamValue::Text("dev".into())));
    }

    #[test]
    fn test_custom_and_constant_override_order() {
        let doc = page("");
        let params = ParamBuilder::new()
            .constant("view", "compact")
            .custom(|_| Params::new().with("view", "full").with("ts", 5u64))
            .build(&doc);
        assert_eq!(params.get("view"), Some(&ParamValue::Text("full".into())));
        assert_eq!(params.get("ts"), Some(&ParamValue::Number(5.0)));
    }
}
