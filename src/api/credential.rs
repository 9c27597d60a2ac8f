//! Credential lookup.

use std::collections::HashMap;

use super::client::{ApiClient, BuildRequest};
use super::envelope::{Endpoint, Payload};

impl ApiClient {
    /// Fields of a stored credential.
    ///
    /// Every failure yields `None`; a missing credential and a transient error
    /// look the same to the caller.
    pub fn credential(&self, credential_id: &str) -> Option<HashMap<String, String>> {
        tracing::info!("Begin to get certificate");

        let path = format!("/ticket/api/build/credentials/{}/detail", urlencoding::encode(credential_id));
        let body = match self.call(BuildRequest::get(path), "failed to get certificate") {
            Ok(body) => body,
            Err(e) => {
                tracing::error!("get certificate failed: {}", e);
                return None;
            }
        };

        match Endpoint::Credential.decode(&body).and_then(Payload::into_strings) {
            Ok(fields) => Some(fields),
            Err(e) => {
                tracing::error!("resolve response json failed: {}", e);
                None
            }
        }
    }
}
