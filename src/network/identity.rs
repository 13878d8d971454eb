use reqwest::header::{
    HeaderMap, HeaderValue, InvalidHeaderValue, ACCEPT_LANGUAGE, UPGRADE_INSECURE_REQUESTS,
    USER_AGENT,
};

// * IdentityProfile defines the browser characteristics presented by both the
// * HTTP client and the automated browser, so image downloads look like the session.
pub struct IdentityProfile {
    pub chrome_version: &'static str,
    pub user_agent: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_platform: String,
    pub accept_language: &'static str,
}

impl IdentityProfile {
    // * Desktop Chrome 120 on Windows with Japanese as the preferred language.
    pub fn desktop_chrome() -> Self {
        let major_version = "120";
        let full_version = "120.0.6099.109";

        Self {
            chrome_version: major_version,
            user_agent: format!(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{} Safari/537.36",
                full_version
            ),
            sec_ch_ua: format!(
                r#""Chromium";v="{}", "Google Chrome";v="{}", "Not_A Brand";v="99""#,
                major_version, major_version
            ),
            sec_ch_ua_platform: r#""Windows""#.to_string(),
            accept_language: "ja,en-US;q=0.9,en;q=0.8",
        }
    }

    // * Applies the profile to a mutable HeaderMap.
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<(), InvalidHeaderValue> {
        headers.insert(USER_AGENT, HeaderValue::from_str(&self.user_agent)?);
        headers.insert("sec-ch-ua", HeaderValue::from_str(&self.sec_ch_ua)?);
        headers.insert("sec-ch-ua-platform", HeaderValue::from_str(&self.sec_ch_ua_platform)?);
        headers.insert("sec-ch-ua-mobile", HeaderValue::from_static("?0"));
        headers.insert(UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(self.accept_language));
        Ok(())
    }

    // * Chrome launch flag carrying the same user agent
    pub fn browser_arg(&self) -> String {
        format!("--user-agent={}", self.user_agent)
    }
}

impl Default for IdentityProfile {
    fn default() -> Self {
        Self::desktop_chrome()
    }
}
