use std::any::Any;
use std::cell::OnceCell;
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Value, json};

use crate::client::Client;
use crate::error::Error;
use crate::field::FieldValue;
use crate::key::ANY_LOCALE;
use crate::link::Link;
use crate::locale::{LocaleContext, LocalizedFields};
use crate::resource::{Asset, ContentType, Resource};
use crate::sys::SystemProperties;

/// An entry: field data shaped by a content type.
///
/// Links in field data stay unresolved until asked for; resolution goes
/// back through the owning client, so a link to an entry that is already
/// cached yields that very instance.
pub struct Entry {
    pub(crate) sys: SystemProperties,
    pub(crate) fields: LocalizedFields,
    pub(crate) locale: LocaleContext,
    pub(crate) client: Weak<Client>,
    pub(crate) model: OnceCell<Box<dyn Any>>,
}

impl Entry {
    pub fn sys(&self) -> &SystemProperties {
        &self.sys
    }

    pub fn id(&self) -> &str {
        self.sys.id()
    }

    pub fn content_type(&self) -> Option<&Rc<ContentType>> {
        self.sys.content_type()
    }

    pub fn fields(&self) -> &LocalizedFields {
        &self.fields
    }

    /// The locale fields are currently read in.
    pub fn locale(&self) -> String {
        self.locale.current()
    }

    /// Changes the locale fields are read in. Must be one of the space's locales.
    pub fn set_locale(&self, code: &str) -> Result<(), Error> {
        self.locale.set(code)
    }

    /// Reads a field in the current locale, falling back along the space's
    /// fallback chain.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.field_in(name, &self.locale.current())
    }

    pub fn field_in(&self, name: &str, locale: &str) -> Option<&FieldValue> {
        self.fields.get_in(name, locale, self.locale.locales())
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_str)
    }

    /// The caller-registered model this entry was hydrated into, if any.
    pub fn model<T: 'static>(&self) -> Option<&T> {
        self.model.get().and_then(|model| model.downcast_ref::<T>())
    }

    /// Locale linked resources are fetched in: the view locale for
    /// single-locale entries, every locale otherwise.
    fn link_locale(&self) -> String {
        match self.sys.locale() {
            Some(_) => self.locale.current(),
            None => ANY_LOCALE.to_string(),
        }
    }

    /// Resolves a link through the owning client.
    pub fn resolve(&self, link: &Link) -> Result<Resource, Error> {
        let client = self.client.upgrade().ok_or(Error::ClientDropped)?;
        client.resolve_link(link, Some(&self.link_locale()))
    }

    /// Resolves the link held by `name`; `None` if the field holds no link.
    pub fn linked(&self, name: &str) -> Result<Option<Resource>, Error> {
        match self.field(name).and_then(FieldValue::as_link) {
            Some(link) => self.resolve(link).map(Some),
            None => Ok(None),
        }
    }

    pub fn linked_entry(&self, name: &str) -> Result<Option<Rc<Entry>>, Error> {
        self.linked(name)?.map(Resource::into_entry).transpose()
    }

    pub fn linked_asset(&self, name: &str) -> Result<Option<Rc<Asset>>, Error> {
        self.linked(name)?.map(Resource::into_asset).transpose()
    }

    /// Resolves every link held by `name`, in order.
    pub fn linked_all(&self, name: &str) -> Result<Vec<Resource>, Error> {
        match self.field(name) {
            Some(value) => value.links().into_iter().map(|link| self.resolve(link)).collect(),
            None => Ok(Vec::new()),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "sys": self.sys.to_json(),
            "fields": self.fields.to_json(self.sys.locale()),
        })
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.sys == other.sys && self.fields == other.fields
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("sys", &self.sys)
            .field("fields", &self.fields)
            .field("locale", &self.locale.current())
            .field("model", &self.model.get().is_some())
            .finish()
    }
}
