//! Wire shapes for the legacy multicast push API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct MulticastRequestDto<'a> {
    pub(super) registration_ids: Vec<&'a str>,
    pub(super) notification: NotificationDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct NotificationDto<'a> {
    pub(super) title: &'a str,
    pub(super) body: &'a str,
}

#[derive(Debug, Deserialize)]
pub(super) struct MulticastResponseDto {
    #[serde(default)]
    pub(super) results: Vec<TokenResultDto>,
}

/// One result per registration id, in request order.
#[derive(Debug, Deserialize)]
pub(super) struct TokenResultDto {
    pub(super) message_id: Option<String>,
    pub(super) error: Option<String>,
}
