//! Portal session authenticator.
//!
//! One [`PortalClient::login`] call performs the whole handshake for one
//! user on a fresh reqwest client, so cookies never leak between roster
//! users: fetch the login page, infer the form, submit the GB18030
//! payload, classify the response. The returned session keeps the cookie
//! jar alive for the one-hop fallback fetch.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header;
use scraper::{Html, Selector};
use url::Url;

use scorescrape_core::error::PortalError;
use scorescrape_core::model::Credential;
use scorescrape_core::traits::{AuthenticatedSession, Interaction, Page, PortalGateway};

use crate::codec;
use crate::config::PortalConfig;
use crate::fields::{self, FormMethod};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=gb18030";

/// Soft positive signals on a post-login page. Hits are logged, not
/// required; some landing pages need a further click-through before any
/// score text appears.
const SCORE_KEYWORDS: &[&str] = &["成绩", "分数", "课程", "科目", "总分", "试卷"];

/// Gateway implementation over reqwest.
pub struct PortalClient {
    config: PortalConfig,
    login_url: Url,
}

impl PortalClient {
    pub fn new(config: PortalConfig) -> anyhow::Result<Self> {
        anyhow::ensure!(
            !config.login_url.is_empty(),
            "portal.login_url is not configured"
        );
        let login_url = Url::parse(&config.login_url)?;
        Ok(Self { config, login_url })
    }

    /// Fresh client per user: scoped cookie jar, fixed timeout, browser UA.
    fn build_client(&self) -> Result<reqwest::Client, PortalError> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(self.config.user_agent.clone())
            .build()
            .map_err(|e| PortalError::Network(e.to_string()))
    }

    fn map_send_error(&self, e: reqwest::Error) -> PortalError {
        if e.is_timeout() {
            PortalError::Timeout(self.config.timeout_secs)
        } else {
            PortalError::Network(e.to_string())
        }
    }

    async fn read_page(&self, response: reqwest::Response) -> Result<Page, PortalError> {
        let status = response.status();
        let url = response.url().clone();
        if !status.is_success() {
            return Err(PortalError::Http {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_send_error(e))?;
        Ok(Page::new(url, codec::decode_body(&bytes, content_type.as_deref())))
    }

    async fn fetch(
        &self,
        client: &reqwest::Client,
        url: Url,
        referer: Option<&Url>,
    ) -> Result<Page, PortalError> {
        let mut request = client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str());
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer.to_string());
        }
        let response = request.send().await.map_err(|e| self.map_send_error(e))?;
        self.read_page(response).await
    }

    fn dump_debug(&self, account: &str, tag: &str, html: &str) {
        let Some(dir) = &self.config.debug_dir else {
            return;
        };
        if let Err(e) = write_dump(dir, account, tag, html) {
            tracing::debug!("debug dump failed: {e}");
        }
    }
}

fn write_dump(dir: &Path, account: &str, tag: &str, html: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let safe: String = account
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    std::fs::write(dir.join(format!("{safe}_{tag}.html")), html)
}

/// A page is "logged in" when it no longer offers a password prompt.
/// Deliberately permissive: keyword presence is logged, not required.
pub fn is_login_success(html: &str) -> bool {
    let doc = Html::parse_document(html);
    let pwd_sel = Selector::parse("input[type=\"password\"]").expect("static selector");
    if doc.select(&pwd_sel).next().is_some() {
        return false;
    }
    let hits = SCORE_KEYWORDS.iter().filter(|k| html.contains(*k)).count();
    if hits == 0 {
        tracing::debug!("no score keywords on post-login page; assuming click-through landing");
    }
    true
}

fn mentions_captcha(html: &str) -> bool {
    html.contains("验证码") || html.contains("驗證碼") || html.to_ascii_lowercase().contains("captcha")
}

#[async_trait]
impl PortalGateway for PortalClient {
    #[tracing::instrument(skip_all, fields(account = %credential.login_account()))]
    async fn login(
        &self,
        credential: &Credential,
        interaction: &dyn Interaction,
    ) -> Result<Box<dyn AuthenticatedSession>, PortalError> {
        let client = self.build_client()?;
        let account = credential.login_account();

        let login_page = self.fetch(&client, self.login_url.clone(), None).await?;
        self.dump_debug(account, "login_page", &login_page.html);

        let captcha = if self.config.captcha_prompt && mentions_captcha(&login_page.html) {
            interaction.prompt_captcha(account)
        } else {
            None
        };

        let descriptor = fields::infer_form(&login_page.html, &self.config.field_overrides)?;
        let payload = descriptor.payload(account, &credential.password, captcha.as_deref());
        let body = codec::encode_form(&payload);

        let action_url = match descriptor.action.as_deref() {
            Some(action) if !action.trim().is_empty() => login_page
                .url
                .join(action.trim())
                .map_err(|e| PortalError::Network(format!("bad form action: {e}")))?,
            _ => login_page.url.clone(),
        };

        let response = match descriptor.method {
            FormMethod::Post => client
                .post(action_url)
                .header(header::REFERER, self.login_url.to_string())
                .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
                .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str())
                .body(body)
                .send()
                .await
                .map_err(|e| self.map_send_error(e))?,
            FormMethod::Get => {
                let mut url = action_url;
                url.set_query((!body.is_empty()).then_some(body.as_str()));
                client
                    .get(url)
                    .header(header::REFERER, self.login_url.to_string())
                    .header(header::ACCEPT_LANGUAGE, self.config.accept_language.as_str())
                    .send()
                    .await
                    .map_err(|e| self.map_send_error(e))?
            }
        };

        let landing = self.read_page(response).await?;
        self.dump_debug(account, "after_login", &landing.html);

        if !is_login_success(&landing.html) {
            self.dump_debug(account, "login_failed", &landing.html);
            return Err(PortalError::LoginRejected);
        }

        Ok(Box::new(PortalSession {
            portal: PortalClient {
                config: self.config.clone(),
                login_url: self.login_url.clone(),
            },
            client,
            landing,
        }))
    }
}

/// A logged-in session: the per-user client plus its landing page.
pub struct PortalSession {
    portal: PortalClient,
    client: reqwest::Client,
    landing: Page,
}

#[async_trait]
impl AuthenticatedSession for PortalSession {
    fn landing(&self) -> &Page {
        &self.landing
    }

    async fn follow(&self, href: &str) -> Result<Page, PortalError> {
        let url = self
            .landing
            .url
            .join(href)
            .map_err(|e| PortalError::Network(format!("bad link {href}: {e}")))?;
        self.portal
            .fetch(&self.client, url, Some(&self.landing.url))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scorescrape_core::traits::NonInteractive;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const LOGIN_FORM: &str = r#"<html><head><meta charset="utf-8"></head>
    <body><form action="check.asp" method="post">
        <input type="hidden" name="token" value="abc123">
        <input type="text" name="zh">
        <input type="password" name="mm">
    </form></body></html>"#;

    const SCORE_PAGE: &str = r#"<html><head><meta charset="utf-8"></head><body>期末考试成绩
        <table><tr><td>姓名</td><td>总分</td></tr><tr><td>甲</td><td>600</td></tr></table>
    </body></html>"#;

    fn client_for(server: &MockServer) -> PortalClient {
        let config = PortalConfig {
            login_url: format!("{}/xs/cjcx/index.asp", server.uri()),
            timeout_secs: 5,
            ..PortalConfig::default()
        };
        PortalClient::new(config).unwrap()
    }

    fn cred(name: &str) -> Credential {
        Credential {
            name: name.into(),
            account: None,
            password: "pw123".into(),
        }
    }

    #[tokio::test]
    async fn full_login_handshake() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/index.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xs/cjcx/check.asp"))
            .and(header("content-type", FORM_CONTENT_TYPE))
            .and(body_string_contains("token=abc123"))
            .and(body_string_contains("zh=s001"))
            .and(body_string_contains("mm=pw123"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SCORE_PAGE))
            .mount(&server)
            .await;

        let session = client_for(&server)
            .login(&cred("s001"), &NonInteractive)
            .await
            .unwrap();
        assert!(session.landing().html.contains("总分"));
    }

    #[tokio::test]
    async fn chinese_account_is_gb18030_encoded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/index.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
            .mount(&server)
            .await;

        // 陈 = %B3%C2, 宇 = %D3%EE in GB18030
        Mock::given(method("POST"))
            .and(path("/xs/cjcx/check.asp"))
            .and(body_string_contains("zh=%B3%C2%D3%EE"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SCORE_PAGE))
            .mount(&server)
            .await;

        let session = client_for(&server)
            .login(&cred("陈宇"), &NonInteractive)
            .await
            .unwrap();
        assert!(session.landing().html.contains("期末考试"));
    }

    #[tokio::test]
    async fn persistent_password_prompt_is_a_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/index.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xs/cjcx/check.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&cred("s001"), &NonInteractive)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PortalError::LoginRejected));
    }

    #[tokio::test]
    async fn follow_resolves_relative_links() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/index.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_FORM))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/xs/cjcx/check.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><head><meta charset=\"utf-8\"></head>\
                 <body>请<a href=\"cj.asp\">点击</a></body></html>",
            ))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/cj.asp"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SCORE_PAGE))
            .mount(&server)
            .await;

        let session = client_for(&server)
            .login(&cred("s001"), &NonInteractive)
            .await
            .unwrap();
        let linked = session.follow("cj.asp").await.unwrap();
        assert!(linked.html.contains("总分"));
    }

    #[tokio::test]
    async fn http_error_is_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/xs/cjcx/index.asp"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .login(&cred("s001"), &NonInteractive)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, PortalError::Http { status: 500, .. }));
    }

    #[test]
    fn success_classification_is_permissive() {
        assert!(is_login_success("<html><body>空白页</body></html>"));
        assert!(is_login_success(SCORE_PAGE));
        assert!(!is_login_success(LOGIN_FORM));
    }

    #[test]
    fn captcha_detection() {
        assert!(mentions_captcha("<p>请输入验证码</p>"));
        assert!(mentions_captcha("<p>Captcha required</p>"));
        assert!(!mentions_captcha(LOGIN_FORM));
    }
}
