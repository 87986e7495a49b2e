//! Reqwest-backed multicast push adapter.
//!
//! One POST per chunk of at most [`MAX_TOKENS_PER_REQUEST`] tokens. The
//! response lists one result per token in request order; error codes that
//! mean the token will never work again become
//! [`DeliveryFailure::InvalidToken`] so the caller prunes them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{MulticastRequestDto, MulticastResponseDto, NotificationDto, TokenResultDto};
use crate::domain::DeliveryToken;
use crate::domain::ports::{
    DeliveryFailure, DeliveryOutcome, NotificationDelivery, NotificationDeliveryError,
    PushNotification,
};

/// Upper bound the push service accepts in one multicast request.
pub const MAX_TOKENS_PER_REQUEST: usize = 1000;

/// Error codes meaning the token is permanently invalid.
const PERMANENT_ERROR_CODES: [&str; 6] = [
    "NotRegistered",
    "InvalidRegistration",
    "MismatchSenderId",
    "messaging/registration-token-not-registered",
    "messaging/invalid-registration-token",
    "messaging/mismatched-credential",
];

/// Push service URL and the server key sent with each request.
pub struct PushEndpoint {
    pub url: Url,
    pub server_key: Zeroizing<String>,
}

/// Push adapter posting multicast requests to one endpoint.
pub struct HttpNotificationDelivery {
    client: Client,
    endpoint: Url,
    authorization: Zeroizing<String>,
}

impl HttpNotificationDelivery {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: PushEndpoint, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.url,
            authorization: Zeroizing::new(format!("key={}", endpoint.server_key.as_str())),
        })
    }

    async fn deliver_chunk(
        &self,
        tokens: &[DeliveryToken],
        notification: &PushNotification,
    ) -> Result<Vec<DeliveryOutcome>, NotificationDeliveryError> {
        let request = MulticastRequestDto {
            registration_ids: tokens.iter().map(AsRef::as_ref).collect(),
            notification: NotificationDto {
                title: &notification.title,
                body: &notification.body,
            },
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, self.authorization.as_str())
            .json(&request)
            .send()
            .await
            .map_err(|err| NotificationDeliveryError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| NotificationDeliveryError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }

        let decoded: MulticastResponseDto = serde_json::from_slice(&body).map_err(|err| {
            NotificationDeliveryError::transport(format!("invalid push response: {err}"))
        })?;
        Ok(pair_results(tokens, decoded.results))
    }
}

#[async_trait]
impl NotificationDelivery for HttpNotificationDelivery {
    async fn deliver(
        &self,
        tokens: &[DeliveryToken],
        notification: &PushNotification,
    ) -> Result<Vec<DeliveryOutcome>, NotificationDeliveryError> {
        let mut outcomes = Vec::with_capacity(tokens.len());
        for (index, chunk) in tokens.chunks(MAX_TOKENS_PER_REQUEST).enumerate() {
            match self.deliver_chunk(chunk, notification).await {
                Ok(delivered) => outcomes.extend(delivered),
                Err(error) if index == 0 => return Err(error),
                // Earlier chunks were already sent; keep their outcomes.
                Err(error) => {
                    tracing::warn!(chunk = index, tokens = chunk.len(), %error, "push chunk failed");
                    outcomes.extend(chunk_failed(chunk, &error));
                }
            }
        }
        Ok(outcomes)
    }
}

fn map_status_error(status: StatusCode) -> NotificationDeliveryError {
    let message = format!("status {}", status.as_u16());
    if status.is_client_error() {
        NotificationDeliveryError::rejected(message)
    } else {
        NotificationDeliveryError::transport(message)
    }
}

fn classify_result(result: TokenResultDto) -> Result<(), DeliveryFailure> {
    match (result.message_id, result.error) {
        (_, Some(code)) if PERMANENT_ERROR_CODES.contains(&code.as_str()) => {
            Err(DeliveryFailure::InvalidToken { code })
        }
        (_, Some(message)) => Err(DeliveryFailure::Transient { message }),
        (Some(_), None) => Ok(()),
        (None, None) => Err(DeliveryFailure::Transient {
            message: "no result reported".to_owned(),
        }),
    }
}

/// Outcomes for a chunk whose request failed; retried on the next sweep.
fn chunk_failed(
    tokens: &[DeliveryToken],
    error: &NotificationDeliveryError,
) -> impl Iterator<Item = DeliveryOutcome> {
    let message = error.to_string();
    tokens.iter().cloned().map(move |token| {
        DeliveryOutcome::failed(
            token,
            DeliveryFailure::Transient {
                message: message.clone(),
            },
        )
    })
}

/// Zip results with tokens; tokens without a result count as transient failures.
fn pair_results(tokens: &[DeliveryToken], results: Vec<TokenResultDto>) -> Vec<DeliveryOutcome> {
    let mut results = results.into_iter();
    tokens
        .iter()
        .cloned()
        .map(|token| {
            let verdict = results.next().map_or_else(
                || {
                    Err(DeliveryFailure::Transient {
                        message: "missing result".to_owned(),
                    })
                },
                classify_result,
            );
            match verdict {
                Ok(()) => DeliveryOutcome::delivered(token),
                Err(failure) => DeliveryOutcome::failed(token, failure),
            }
        })
        .collect()
}
