use std::cell::RefCell;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;
use crate::field::FieldValue;
use crate::key::ResourceKind;

/// A locale declared by a space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub fallback_code: Option<String>,
    #[serde(default)]
    pub optional: bool,
}

/// Values of a single field, keyed by locale code.
pub type LocalizedValue = IndexMap<String, FieldValue>;

/// Normalizes one raw field value into its locale mapping.
///
/// Single-locale documents (`locale` is `Some`) carry flat values, which are
/// wrapped under that locale. Multi-locale documents carry an object keyed by
/// locale code already. Returns `None` when a multi-locale value is not an
/// object.
pub fn normalize_field(raw: &Value, locale: Option<&str>) -> Option<LocalizedValue> {
    match locale {
        Some(locale) => Some(IndexMap::from([(locale.to_string(), FieldValue::from_json(raw))])),
        None => raw.as_object().map(|values| {
            values
                .iter()
                .map(|(code, value)| (code.clone(), FieldValue::from_json(value)))
                .collect()
        }),
    }
}

/// Locale codes to try, in order, when reading a field in `code`.
///
/// Follows `fallbackCode` until a locale without one; stops on a cycle.
pub fn fallback_chain<'a>(locales: &'a [Locale], code: &'a str) -> Vec<&'a str> {
    let mut chain = vec![code];
    let mut current = code;
    while let Some(next) = locales
        .iter()
        .find(|locale| locale.code == current)
        .and_then(|locale| locale.fallback_code.as_deref())
    {
        if chain.contains(&next) {
            break;
        }
        chain.push(next);
        current = next;
    }
    chain
}

/// The fields of a locale-aware resource, as field id → locale → value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalizedFields(IndexMap<String, LocalizedValue>);

impl LocalizedFields {
    /// Normalizes the `fields` object of a raw document.
    pub fn from_document(
        kind: ResourceKind,
        id: &str,
        raw: Option<&Value>,
        locale: Option<&str>,
    ) -> Result<Self, Error> {
        let Some(raw) = raw else {
            return Ok(Self::default());
        };
        let object = raw
            .as_object()
            .ok_or_else(|| Error::mapping(kind, id, "fields is not an object"))?;

        let mut fields = IndexMap::with_capacity(object.len());
        for (name, value) in object {
            let values = normalize_field(value, locale).ok_or_else(|| {
                Error::mapping(kind, id, format!("field {name} is not keyed by locale"))
            })?;
            fields.insert(name.clone(), values);
        }
        Ok(LocalizedFields(fields))
    }

    pub fn get(&self, field: &str) -> Option<&LocalizedValue> {
        self.0.get(field)
    }

    /// Reads `field` in `locale`, walking the fallback chain on a miss.
    pub fn get_in<'a>(&'a self, field: &str, locale: &str, locales: &[Locale]) -> Option<&'a FieldValue> {
        let values = self.0.get(field)?;
        fallback_chain(locales, locale)
            .into_iter()
            .find_map(|code| values.get(code))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the fields back into the API's shape: flat values for a
    /// single-locale document, locale objects otherwise.
    pub fn to_json(&self, locale: Option<&str>) -> Value {
        let mut out = Map::new();
        for (name, values) in &self.0 {
            match locale {
                Some(locale) => {
                    if let Some(value) = values.get(locale) {
                        out.insert(name.clone(), value.to_json());
                    }
                }
                None => {
                    let localized = values
                        .iter()
                        .map(|(code, value)| (code.clone(), value.to_json()))
                        .collect();
                    out.insert(name.clone(), Value::Object(localized));
                }
            }
        }
        Value::Object(out)
    }
}

/// Locale metadata primed on locale-aware resources: the space's locale list
/// and the locale fields are currently viewed in.
#[derive(Debug)]
pub struct LocaleContext {
    locales: Vec<Locale>,
    current: RefCell<String>,
}

impl LocaleContext {
    pub(crate) fn new(locales: Vec<Locale>, current: String) -> Self {
        LocaleContext {
            locales,
            current: RefCell::new(current),
        }
    }

    pub fn locales(&self) -> &[Locale] {
        &self.locales
    }

    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    /// Switches the view locale. Identity is unaffected.
    pub fn set(&self, code: &str) -> Result<(), Error> {
        if !self.locales.iter().any(|locale| locale.code == code) {
            return Err(Error::UnknownLocale(code.to_string()));
        }
        *self.current.borrow_mut() = code.to_string();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn locale(code: &str, fallback: Option<&str>) -> Locale {
        Locale {
            code: code.to_string(),
            name: code.to_string(),
            default: fallback.is_none(),
            fallback_code: fallback.map(str::to_string),
            optional: false,
        }
    }

    #[test]
    fn single_and_multi_locale_normalize_alike() {
        let multi = normalize_field(&json!({"en-US": "hello"}), None).unwrap();
        let single = normalize_field(&json!("hello"), Some("en-US")).unwrap();
        assert_eq!(multi, single);
    }

    #[test]
    fn multi_locale_value_must_be_object() {
        assert!(normalize_field(&json!("hello"), None).is_none());
    }

    #[test]
    fn fallback_chain_follows_codes() {
        let locales = vec![
            locale("en-US", None),
            locale("de-DE", Some("en-US")),
            locale("de-CH", Some("de-DE")),
        ];
        assert_eq!(fallback_chain(&locales, "de-CH"), vec!["de-CH", "de-DE", "en-US"]);
        assert_eq!(fallback_chain(&locales, "fr-FR"), vec!["fr-FR"]);
    }

    #[test]
    fn fallback_chain_stops_on_cycle() {
        let locales = vec![locale("a", Some("b")), locale("b", Some("a"))];
        assert_eq!(fallback_chain(&locales, "a"), vec!["a", "b"]);
    }

    #[test]
    fn fields_read_through_fallback() {
        let locales = vec![locale("en-US", None), locale("tlh", Some("en-US"))];
        let raw = json!({
            "name": {"en-US": "Nyan Cat", "tlh": "Nyan vIghro'"},
            "color": {"en-US": "rainbow"},
        });
        let fields =
            LocalizedFields::from_document(ResourceKind::Entry, "nyancat", Some(&raw), None).unwrap();

        let name = fields.get_in("name", "tlh", &locales).unwrap();
        assert_eq!(name.as_str(), Some("Nyan vIghro'"));
        let color = fields.get_in("color", "tlh", &locales).unwrap();
        assert_eq!(color.as_str(), Some("rainbow"));
        assert!(fields.get_in("missing", "tlh", &locales).is_none());
    }

    #[test]
    fn fields_render_back_per_document_shape() {
        let raw = json!({"name": "Nyan Cat", "lives": 9});
        let fields =
            LocalizedFields::from_document(ResourceKind::Entry, "nyancat", Some(&raw), Some("en-US"))
                .unwrap();
        assert_eq!(fields.to_json(Some("en-US")), raw);
        assert_eq!(
            fields.to_json(None),
            json!({"name": {"en-US": "Nyan Cat"}, "lives": {"en-US": 9}})
        );
    }

    #[test]
    fn unknown_view_locale_rejected() {
        let context = LocaleContext::new(vec![locale("en-US", None)], "en-US".to_string());
        assert!(matches!(context.set("xx"), Err(Error::UnknownLocale(_))));
        assert_eq!(context.current(), "en-US");
    }
}
