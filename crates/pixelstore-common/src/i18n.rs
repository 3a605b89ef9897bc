//! Localized message catalog.
//!
//! User-facing error messages are looked up by key through [`translate`] (or
//! the [`t!`](crate::t) macro) so the storage layer never hard-codes prose.
//! The locale is selected once at startup with [`set_locale`]; lookups fall
//! back to English and then to the key itself.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

/// Supported message locales.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English (default).
    #[default]
    En,
    /// Spanish.
    Es,
}

impl Locale {
    /// Canonical locale label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }

    /// Parse a locale tag, ignoring case and region suffixes (`es-MX`, `en_GB`).
    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.split(['-', '_']).next().unwrap_or("") {
            "en" => Some(Self::En),
            "es" => Some(Self::Es),
            _ => None,
        }
    }
}

/// A named placeholder value substituted into a message template.
#[derive(Debug, Clone)]
pub struct MessageArg {
    /// Placeholder name without braces (e.g. `img`).
    pub key: &'static str,
    /// Already formatted value.
    pub value: String,
}

impl MessageArg {
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

static CURRENT_LOCALE: OnceLock<Locale> = OnceLock::new();

/// Select the process-wide locale. Only the first call wins.
pub fn set_locale(locale: Locale) {
    let _ = CURRENT_LOCALE.set(locale);
}

/// The selected locale, English when none was set.
pub fn current_locale() -> Locale {
    CURRENT_LOCALE.get().copied().unwrap_or_default()
}

const CATALOG_EN: &[(&str, &str)] = &[
    ("errors.image_not_found_with_ref", "Image not found: {img}"),
    ("errors.cannot_read_image", "Could not read image: {img}"),
    ("errors.cannot_write_image", "Could not store image: {img}"),
    ("errors.bad_request", "Invalid image path: {img}"),
    ("errors.path_outside_root", "Path is outside the storage root: {img}"),
    ("errors.no_permission", "No permission to access image: {img}"),
    ("errors.serve_failed", "Could not serve image: {img}"),
    ("errors.not_implemented", "not implemented"),
];

const CATALOG_ES: &[(&str, &str)] = &[
    ("errors.image_not_found_with_ref", "Imagen no encontrada: {img}"),
    ("errors.cannot_read_image", "No se pudo leer la imagen: {img}"),
    ("errors.cannot_write_image", "No se pudo guardar la imagen: {img}"),
    ("errors.bad_request", "Ruta de imagen no válida: {img}"),
    (
        "errors.path_outside_root",
        "La ruta está fuera del directorio de almacenamiento: {img}",
    ),
    ("errors.no_permission", "Sin permiso para acceder a la imagen: {img}"),
    ("errors.serve_failed", "No se pudo servir la imagen: {img}"),
    ("errors.not_implemented", "no implementado"),
];

fn catalog_for(locale: Locale) -> &'static HashMap<&'static str, &'static str> {
    static EN: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    static ES: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();

    match locale {
        Locale::En => EN.get_or_init(|| CATALOG_EN.iter().copied().collect()),
        Locale::Es => ES.get_or_init(|| CATALOG_ES.iter().copied().collect()),
    }
}

/// Translate `key` in the current locale, substituting `args`.
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    translate_in(current_locale(), key, args)
}

/// Translate `key` in an explicit locale.
pub fn translate_in(locale: Locale, key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog_for(locale)
        .get(key)
        .or_else(|| catalog_for(Locale::En).get(key))
        .copied()
        .unwrap_or(key);

    let mut message = template.to_string();
    for arg in args {
        message = message.replace(&format!("{{{}}}", arg.key), &arg.value);
    }
    message
}

/// Format a localized message from a catalog key and named arguments.
///
/// ```
/// use pixelstore_common::t;
///
/// let msg = t!("errors.image_not_found_with_ref", img = "2024/05/cat.jpg");
/// assert!(msg.contains("2024/05/cat.jpg"));
/// ```
#[macro_export]
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::i18n::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::i18n::translate($key, args)
    }};
}
