/// Builds the absolute links embedded in emails.
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    base_url: String,
}

impl LinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
        }
    }

    pub fn confirm(&self, token: &str) -> String {
        format!("{}/api/confirm/{token}", self.base_url)
    }

    pub fn unsubscribe(&self, token: &str) -> String {
        format!("{}/api/unsubscribe/{token}", self.base_url)
    }
}
