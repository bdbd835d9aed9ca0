use std::env::var;

use dotenvy::dotenv;
use secrecy::Secret;

use crate::domain::models::sdk::DEFAULT_LOCALE;

const DEFAULT_GRAPH_URL: &str = "https://graph.facebook.com";
const DEFAULT_LOGIN_SCOPE: &str =
    "pages_show_list,pages_messaging,pages_manage_metadata,pages_read_engagement";

pub struct Config {
    pub port: u16,
    pub scheme: String,
    pub host: String,
    pub channel_backend_url: String,
    pub identity_backend_url: String,
    pub firm_account: String,
    pub firm_password: Secret<String>,
    pub facebook_graph_url: String,
    pub facebook_login_scope: String,
    pub facebook_sdk_locale: String,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            port: var("PORT")
                .map_err(|_| "An error occured while getting PORT env param")?
                .parse::<u16>()
                .map_err(|_| "An error occured while parsing PORT env param")?,
            scheme: var("SCHEME").map_err(|_| "An error occured while getting SCHEME env param")?,
            host: var("HOST").map_err(|_| "An error occured while getting HOST env param")?,
            channel_backend_url: var("CHANNEL_BACKEND_URL")
                .map_err(|_| "An error occured while getting CHANNEL_BACKEND_URL env param")?,
            identity_backend_url: var("IDENTITY_BACKEND_URL")
                .map_err(|_| "An error occured while getting IDENTITY_BACKEND_URL env param")?,
            firm_account: var("FIRM_ACCOUNT")
                .map_err(|_| "An error occured while getting FIRM_ACCOUNT env param")?,
            firm_password: var("FIRM_PASSWORD")
                .map(Secret::new)
                .map_err(|_| "An error occured while getting FIRM_PASSWORD env param")?,
            facebook_graph_url: optional("FACEBOOK_GRAPH_URL", DEFAULT_GRAPH_URL),
            facebook_login_scope: optional("FACEBOOK_LOGIN_SCOPE", DEFAULT_LOGIN_SCOPE),
            facebook_sdk_locale: optional("FACEBOOK_SDK_LOCALE", DEFAULT_LOCALE),
        })
    }
}

fn optional(name: &str, default: &str) -> String {
    var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}
