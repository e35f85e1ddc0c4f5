use reqwest::multipart::{Form, Part};
use reqwest::Method;

use super::{decode, ApiClient, ApiResult};
use crate::api::models::{CreateKnowledgeBaseRequest, Document, KnowledgeBase};

impl ApiClient {
    pub async fn knowledge_bases(&self, character_id: &str) -> ApiResult<Vec<KnowledgeBase>> {
        self.get_json(&format!("knowledge/character/{character_id}"), &[])
            .await
    }

    pub async fn create_knowledge_base(
        &self,
        request: &CreateKnowledgeBaseRequest,
    ) -> ApiResult<KnowledgeBase> {
        self.send_json(Method::POST, "knowledge", Some(request)).await
    }

    pub async fn delete_knowledge_base(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &format!("knowledge/{id}")).await
    }

    pub async fn documents(&self, knowledge_base_id: &str) -> ApiResult<Vec<Document>> {
        self.get_json(&format!("knowledge/{knowledge_base_id}/documents"), &[])
            .await
    }

    /// Multipart upload under the `file` field.
    pub async fn upload_document(
        &self,
        knowledge_base_id: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> ApiResult<Document> {
        let endpoint = format!("knowledge/{knowledge_base_id}/documents");
        let response = self
            .execute(&endpoint, |http, url| {
                let part = Part::bytes(bytes.clone()).file_name(file_name.to_string());
                http.post(url).multipart(Form::new().part("file", part))
            })
            .await?;
        decode(&endpoint, response).await
    }

    pub async fn delete_document(&self, knowledge_base_id: &str, document_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("knowledge/{knowledge_base_id}/documents/{document_id}"),
        )
        .await
    }
}
