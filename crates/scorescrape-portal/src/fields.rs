//! Login-form field inference.
//!
//! The portal's login form changes field names between deployments
//! (adminname/adminpwd, zh/mm, xh/pwd have all been seen), so field names
//! are inferred from the page each run. Precedence: configured overrides,
//! then `type=password`, then known name aliases, then position among
//! text-like inputs.

use scraper::{ElementRef, Html, Selector};

use scorescrape_core::error::PortalError;

use crate::config::FieldOverrides;

/// Name-attribute aliases the portal family uses for the username field.
const USERNAME_ALIASES: &[&str] = &["xm", "xh", "name", "zh", "account", "xj", "kzh"];

/// Aliases for the password field beyond `type=password`.
const PASSWORD_ALIASES: &[&str] = &["mm", "pwd"];

/// Placeholder fragments that mark a text input as the username.
const USERNAME_PLACEHOLDERS: &[&str] = &["user", "学号", "账号"];

/// HTTP method of the login form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMethod {
    Post,
    Get,
}

impl FormMethod {
    fn from_attr(attr: Option<&str>) -> Self {
        match attr.map(str::to_ascii_lowercase).as_deref() {
            Some("get") => FormMethod::Get,
            _ => FormMethod::Post,
        }
    }
}

/// Everything needed to submit the login form.
#[derive(Debug, Clone)]
pub struct FormDescriptor {
    pub username_field: String,
    pub password_field: String,
    pub captcha_field: Option<String>,
    /// Raw action attribute; resolved against the login page URL later.
    pub action: Option<String>,
    pub method: FormMethod,
    /// Hidden inputs copied verbatim into the payload (CSRF tokens and
    /// session markers the form round-trips).
    pub hidden: Vec<(String, String)>,
}

impl FormDescriptor {
    /// Assemble the submission payload for one credential.
    pub fn payload(
        &self,
        account: &str,
        password: &str,
        captcha: Option<&str>,
    ) -> Vec<(String, String)> {
        let mut pairs = self.hidden.clone();
        pairs.push((self.username_field.clone(), account.to_string()));
        pairs.push((self.password_field.clone(), password.to_string()));
        if let (Some(field), Some(value)) = (&self.captcha_field, captcha) {
            pairs.push((field.clone(), value.to_string()));
        }
        pairs
    }
}

struct InputInfo {
    name: Option<String>,
    kind: String,
    placeholder: String,
    value: String,
}

fn input_info(el: ElementRef<'_>) -> InputInfo {
    let attr = |name: &str| el.value().attr(name).unwrap_or_default().to_string();
    InputInfo {
        name: el.value().attr("name").map(str::to_string),
        kind: attr("type").to_ascii_lowercase(),
        placeholder: attr("placeholder").to_ascii_lowercase(),
        value: attr("value"),
    }
}

/// Infer a [`FormDescriptor`] from a login page.
///
/// Fails with [`PortalError::FieldInference`] when neither inference nor
/// overrides can name both the username and password fields.
pub fn infer_form(html: &str, overrides: &FieldOverrides) -> Result<FormDescriptor, PortalError> {
    let doc = Html::parse_document(html);
    let form_sel = Selector::parse("form").expect("static selector");
    let input_sel = Selector::parse("input").expect("static selector");

    let form = doc
        .select(&form_sel)
        .next()
        .ok_or_else(|| PortalError::FieldInference("login page has no form".into()))?;

    let inputs: Vec<InputInfo> = form.select(&input_sel).map(input_info).collect();

    let mut username = overrides.username().map(str::to_string);
    let mut password = overrides.password().map(str::to_string);
    let mut captcha = overrides.captcha().map(str::to_string);

    for input in &inputs {
        let name_lc = input
            .name
            .as_deref()
            .unwrap_or_default()
            .to_ascii_lowercase();
        if username.is_none()
            && (name_lc.contains("user")
                || name_lc.contains("account")
                || USERNAME_ALIASES.contains(&name_lc.as_str())
                || (input.kind == "text"
                    && USERNAME_PLACEHOLDERS
                        .iter()
                        .any(|p| input.placeholder.contains(p))))
        {
            username = input.name.clone();
        }
        if password.is_none()
            && (input.kind == "password"
                || name_lc.contains("pass")
                || PASSWORD_ALIASES.contains(&name_lc.as_str()))
        {
            password = input.name.clone();
        }
        if captcha.is_none()
            && (name_lc.contains("yzm")
                || name_lc.contains("captcha")
                || name_lc.contains("verify")
                || name_lc == "code")
        {
            captcha = input.name.clone();
        }
    }

    // Positional fallback over text-like inputs in document order.
    let text_like: Vec<&InputInfo> = inputs
        .iter()
        .filter(|i| matches!(i.kind.as_str(), "text" | "password" | ""))
        .collect();
    if username.is_none() {
        username = text_like.first().and_then(|i| i.name.clone());
    }
    if password.is_none() {
        password = text_like.get(1).and_then(|i| i.name.clone());
    }
    if captcha.is_none() {
        captcha = text_like.get(2).and_then(|i| i.name.clone());
    }

    let (Some(username_field), Some(password_field)) = (username, password) else {
        return Err(PortalError::FieldInference(
            "username/password fields not found; set [portal.field_overrides]".into(),
        ));
    };

    let hidden = inputs
        .iter()
        .filter(|i| i.kind == "hidden")
        .filter_map(|i| i.name.clone().map(|n| (n, i.value.clone())))
        .collect();

    Ok(FormDescriptor {
        username_field,
        password_field,
        captcha_field: captcha,
        action: form.value().attr("action").map(str::to_string),
        method: FormMethod::from_attr(form.value().attr("method")),
        hidden,
    })
}
