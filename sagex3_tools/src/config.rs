use log::*;
use sbo_common::Secret;

#[derive(Debug, Clone, Default)]
pub struct SageX3Config {
    /// Full URL of the CAdxWebServiceXmlCC endpoint, e.g. "https://sage.example.com/soap-generic/syracuse/collaboration/syracuse/CAdxWebServiceXmlCC"
    pub endpoint: String,
    pub username: Secret<String>,
    pub password: Secret<String>,
    /// The Sage connection pool to run requests against.
    pub pool_alias: String,
    /// Language code used for vendor messages, e.g. "ENG" or "FRA".
    pub language: String,
    /// Public name of the web service object. Sales invoices live under "SIH".
    pub public_name: String,
    /// The sales site (SALFCY) invoices are registered against.
    pub sales_site: String,
    /// The invoice type (SIVTYP) assigned to registered invoices.
    pub invoice_type: String,
}

impl SageX3Config {
    pub fn new_from_env_or_default() -> Self {
        let endpoint = std::env::var("SBO_SAGEX3_ENDPOINT").unwrap_or_else(|_| {
            warn!("SBO_SAGEX3_ENDPOINT not set, using (probably useless) default");
            "http://localhost:8124/soap-generic/syracuse/collaboration/syracuse/CAdxWebServiceXmlCC".to_string()
        });
        let username = Secret::new(std::env::var("SBO_SAGEX3_USER").unwrap_or_else(|_| {
            warn!("SBO_SAGEX3_USER not set, using (probably useless) default");
            "admin".to_string()
        }));
        let password = Secret::new(std::env::var("SBO_SAGEX3_PASSWORD").unwrap_or_else(|_| {
            warn!("SBO_SAGEX3_PASSWORD not set, using (probably useless) default");
            "admin".to_string()
        }));
        let pool_alias = std::env::var("SBO_SAGEX3_POOL_ALIAS").unwrap_or_else(|_| {
            warn!("SBO_SAGEX3_POOL_ALIAS not set, using WSPOOL as default");
            "WSPOOL".to_string()
        });
        let language = std::env::var("SBO_SAGEX3_LANGUAGE").unwrap_or_else(|_| "ENG".to_string());
        let public_name = std::env::var("SBO_SAGEX3_PUBLIC_NAME").unwrap_or_else(|_| "SIH".to_string());
        let sales_site = std::env::var("SBO_SAGEX3_SALES_SITE").unwrap_or_else(|_| {
            warn!("SBO_SAGEX3_SALES_SITE not set, using (probably useless) default");
            "SITE1".to_string()
        });
        let invoice_type = std::env::var("SBO_SAGEX3_INVOICE_TYPE").unwrap_or_else(|_| "FAC".to_string());
        Self { endpoint, username, password, pool_alias, language, public_name, sales_site, invoice_type }
    }
}
