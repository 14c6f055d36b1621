//! Verification document API.

use crate::client::CampusRideClient;
use crate::error::Result;
use crate::request::{ApiRequest, FilePart, Upload};
use crate::types::{DocumentKind, DocumentStatus, VerificationStatus};

/// Verification API client.
pub struct VerificationApi {
    client: CampusRideClient,
}

impl VerificationApi {
    pub(crate) fn new(client: CampusRideClient) -> Self {
        Self { client }
    }

    /// Upload a document for review.
    ///
    /// `fields` are sent as extra form fields (e.g. licence number).
    pub async fn upload_document(
        &self,
        kind: DocumentKind,
        file: FilePart,
        fields: &[(&str, &str)],
    ) -> Result<DocumentStatus> {
        let mut upload = Upload::new("document", file).text("document_type", kind.as_str());
        for (name, value) in fields {
            upload = upload.text(*name, *value);
        }

        self.client
            .request(&ApiRequest::post("verification/documents").upload(upload))
            .await?
            .decode_data()
    }

    /// Review state of all submitted documents.
    pub async fn status(&self) -> Result<VerificationStatus> {
        self.client
            .request(&ApiRequest::get("verification/status"))
            .await?
            .decode_data()
    }
}
