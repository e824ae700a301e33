use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::integration;
use crate::integration::Result;

/// Handle to the external notification service. Delivery is best effort: the
/// chat flow fires these and logs failures, it never waits on the outcome to
/// acknowledge a send.
pub type Mailer = Arc<dyn MailSender + Send + Sync>;

#[derive(Clone)]
pub struct Config {
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: String::from("http://127.0.0.1:8025/notifications"),
        }
    }
}

impl Config {
    pub fn env() -> Result<Self> {
        let url = env::var("MAIL_SERVICE_URL")?;
        Ok(Self { url })
    }
}

#[derive(Serialize, Clone, Debug)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait MailSender {
    async fn send(&self, mail: &Mail) -> Result<()>;
}

/// Posts notifications to the mail service over HTTP. The service itself is
/// an external collaborator; it owns templating and SMTP.
pub struct MailClient {
    http: reqwest::Client,
    url: String,
}

impl MailClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: integration::init_http_client(),
            url: config.url.clone(),
        }
    }
}

#[async_trait]
impl MailSender for MailClient {
    async fn send(&self, mail: &Mail) -> Result<()> {
        self.http
            .post(&self.url)
            .json(mail)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
