use std::str::FromStr;

use reqwest::{StatusCode, Url};
use serde_json::Value;

pub struct ApiClient {
    pub url: String,
}

impl ApiClient {
    fn path(&self, endpoint: &str) -> Url {
        Url::from_str(&format!("{}/{endpoint}", self.url)).expect("Invalid endpoint url")
    }

    async fn read(response: reqwest::Response) -> (StatusCode, Value) {
        let status = response.status();
        let body = response.text().await.expect("Failed to get response text");
        let value = serde_json::from_str(&body).expect("Couldn't Parse Value");
        (status, value)
    }

    pub async fn get(&self, client: &reqwest::Client, endpoint: &str) -> (StatusCode, Value) {
        let response = client
            .get(self.path(endpoint))
            .send()
            .await
            .expect("Failed to send http request");
        Self::read(response).await
    }

    pub async fn post(
        &self,
        client: &reqwest::Client,
        endpoint: &str,
        body: &Value,
    ) -> (StatusCode, Value) {
        let response = client
            .post(self.path(endpoint))
            .json(body)
            .send()
            .await
            .expect("Failed to send http request");
        Self::read(response).await
    }
}
