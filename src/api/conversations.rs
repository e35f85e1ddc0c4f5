use async_trait::async_trait;
use reqwest::Method;

use super::{ApiClient, ApiError, ApiResult};
use crate::api::models::{
    Conversation, CreateConversationRequest, Message, MessagePage, SendMessageRequest,
    UpdateConversationRequest,
};
use crate::core::chat_flow::MessageSender;

impl ApiClient {
    pub async fn conversations(&self) -> ApiResult<Vec<Conversation>> {
        self.get_json("conversations", &[]).await
    }

    pub async fn conversation(&self, id: &str) -> ApiResult<Conversation> {
        self.get_json(&format!("conversations/{id}"), &[]).await
    }

    pub async fn create_conversation(&self, character_id: &str) -> ApiResult<Conversation> {
        let body = CreateConversationRequest { character_id };
        self.send_json(Method::POST, "conversations", Some(&body))
            .await
    }

    pub async fn rename_conversation(&self, id: &str, title: &str) -> ApiResult<Conversation> {
        let body = UpdateConversationRequest { title };
        self.send_json(Method::PUT, &format!("conversations/{id}"), Some(&body))
            .await
    }

    pub async fn delete_conversation(&self, id: &str) -> ApiResult<()> {
        self.send_unit(Method::DELETE, &format!("conversations/{id}"))
            .await
    }

    /// Most recent `limit` messages, oldest first. `before` pages backwards
    /// from a message id.
    pub async fn messages(
        &self,
        conversation_id: &str,
        limit: u32,
        before: Option<&str>,
    ) -> ApiResult<MessagePage> {
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_string()));
        }
        self.get_json(&format!("conversations/{conversation_id}/messages"), &query)
            .await
    }

    /// Posts a user message. The server stores it and answers with the
    /// assistant's reply only.
    pub async fn send_message(&self, conversation_id: &str, content: &str) -> ApiResult<Message> {
        let body = SendMessageRequest { content };
        self.send_json(
            Method::POST,
            &format!("conversations/{conversation_id}/messages"),
            Some(&body),
        )
        .await
    }

    pub async fn clear_messages(&self, conversation_id: &str) -> ApiResult<()> {
        self.send_unit(Method::POST, &format!("conversations/{conversation_id}/clear"))
            .await
    }

    pub async fn delete_message(&self, conversation_id: &str, message_id: &str) -> ApiResult<()> {
        self.send_unit(
            Method::DELETE,
            &format!("conversations/{conversation_id}/messages/{message_id}"),
        )
        .await
    }
}

#[async_trait]
impl MessageSender for ApiClient {
    async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError> {
        ApiClient::send_message(self, conversation_id, content).await
    }
}
