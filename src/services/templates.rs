//! Tenant and language keyed strings from the `template` table, rendered with
//! `{{name}}` placeholders.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::json;

use crate::database::{DatabaseError, RecordExt, RecordStore, Table};

pub const REGISTRATION_SUBJECT_KEY: &str = "user_registration_email_subject";
pub const REGISTRATION_BODY_KEY: &str = "user_registration_email_body";

const DEFAULT_REGISTRATION_SUBJECT: &str = "Welcome {{first_name}}, please confirm your email";
const DEFAULT_REGISTRATION_BODY: &str = "<p>Hi {{first_name}} {{last_name}},</p>\
<p>Your channel account for {{email}} is ready. Confirm your email address by visiting \
<a href=\"{{confirm_url}}\">{{confirm_url}}</a>.</p>";

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern"));

/// Value stored under `key` for the tenant and language, if any.
pub async fn lookup(
    store: &dyn RecordStore,
    key: &str,
    tenant: &str,
    lang: &str,
) -> Result<Option<String>, DatabaseError> {
    let row = store
        .select_one(Table::Template, json!({ "k": key, "tenant": tenant, "lang": lang }))
        .await?;
    Ok(row.and_then(|r| r.str_field("v").map(str::to_string)))
}

/// Replace `{{name}}` placeholders. Names missing from `vars` are left as written.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let name = &caps[1];
            vars.iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
                .unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

/// Like [`lookup`], trying `default_lang` when `lang` has no row.
pub async fn lookup_with_fallback(
    store: &dyn RecordStore,
    key: &str,
    tenant: &str,
    lang: &str,
    default_lang: &str,
) -> Result<Option<String>, DatabaseError> {
    if let Some(value) = lookup(store, key, tenant, lang).await? {
        return Ok(Some(value));
    }
    if lang == default_lang {
        return Ok(None);
    }
    lookup(store, key, tenant, default_lang).await
}

/// Subject and body of the registration email. The tenant's rows in `lang`
/// win, then its rows in `default_lang`, then the built-in text.
pub async fn registration_email(
    store: &dyn RecordStore,
    tenant: &str,
    lang: &str,
    default_lang: &str,
    vars: &[(&str, &str)],
) -> Result<(String, String), DatabaseError> {
    let subject = lookup_with_fallback(store, REGISTRATION_SUBJECT_KEY, tenant, lang, default_lang)
        .await?
        .unwrap_or_else(|| DEFAULT_REGISTRATION_SUBJECT.to_string());
    let body = lookup_with_fallback(store, REGISTRATION_BODY_KEY, tenant, lang, default_lang)
        .await?
        .unwrap_or_else(|| DEFAULT_REGISTRATION_BODY.to_string());
    Ok((render(&subject, vars), render(&body, vars)))
}
