/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! HipChat v2 room notifications.
//!
//! `POST {api_base}/room/{room}/notification` with a bearer token and a JSON
//! body.  Any 2xx is a delivery; anything else becomes
//! [`DeliveryError::Rejected`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Serialize;
use tracing::debug;

use super::{Announcer, DeliveryError};
use crate::config::RoomSettings;

/// Upper bound on one notification round-trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct NotificationRequest<'a> {
    message: &'a str,
    message_format: &'static str,
    notify: bool,
}

/// Posts announcements to a single HipChat room.
#[derive(Debug, Clone)]
pub struct HipChatAnnouncer {
    client: reqwest::Client,
    url: Url,
    auth_token: String,
}

impl HipChatAnnouncer {
    /// # Errors
    /// [`DeliveryError::InvalidApiBase`] if `api_base` is not a usable base
    /// URL, [`DeliveryError::Http`] if the HTTP client cannot be built.
    pub fn new(room: &RoomSettings) -> Result<Self, DeliveryError> {
        let url = notification_url(&room.api_base, &room.name)?;
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            url,
            auth_token: room.auth_token.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// `{api_base}/room/{room}/notification`.  The room name is one path segment,
/// percent-encoded; a trailing slash on the base is ignored.
fn notification_url(api_base: &str, room: &str) -> Result<Url, DeliveryError> {
    let invalid = |reason: String| DeliveryError::InvalidApiBase {
        api_base: api_base.to_string(),
        reason,
    };

    let mut url = Url::parse(api_base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid("cannot be a base URL".into()))?
        .pop_if_empty()
        .extend(["room", room.trim(), "notification"]);
    Ok(url)
}

#[async_trait]
impl Announcer for HipChatAnnouncer {
    async fn announce(&self, text: &str) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(self.url.clone())
            .bearer_auth(&self.auth_token)
            .json(&NotificationRequest {
                message: text,
                message_format: "text",
                notify: true,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeliveryError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), "Room notification delivered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(api_base: &str, name: &str) -> RoomSettings {
        RoomSettings {
            name: name.into(),
            auth_token: "secret".into(),
            api_base: api_base.into(),
        }
    }

    #[test]
    fn url_joins_base_and_room() {
        let a = HipChatAnnouncer::new(&room("https://api.hipchat.com/v2/", "lunch")).unwrap();
        assert_eq!(
            a.url().as_str(),
            "https://api.hipchat.com/v2/room/lunch/notification"
        );
    }

    #[test]
    fn url_escapes_spaces_in_room_name() {
        let url = notification_url("http://localhost:9000", " Lunch Crew ").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/room/Lunch%20Crew/notification");
    }

    #[test]
    fn reserved_characters_stay_inside_the_room_segment() {
        let url = notification_url("http://localhost:9000/v2", "Lunch #1/west?").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), None);
        let segments: Vec<&str> = url.path_segments().unwrap().collect();
        assert_eq!(segments, vec!["v2", "room", "Lunch%20%231%2Fwest%3F", "notification"]);
    }

    #[test]
    fn unusable_api_base_is_rejected() {
        let err = HipChatAnnouncer::new(&room("not a url", "lunch")).unwrap_err();
        assert!(matches!(err, DeliveryError::InvalidApiBase { .. }));
        assert!(matches!(
            notification_url("mailto:lunch@example.com", "lunch"),
            Err(DeliveryError::InvalidApiBase { .. })
        ));
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(NotificationRequest {
            message: "hi",
            message_format: "text",
            notify: true,
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "hi", "message_format": "text", "notify": true})
        );
    }

    #[tokio::test]
    async fn unreachable_room_is_a_delivery_error() {
        // Port 9 (discard) on localhost is closed in CI containers.
        let a = HipChatAnnouncer::new(&room("http://127.0.0.1:9", "lunch")).unwrap();
        let err = a.announce("hello").await.unwrap_err();
        assert!(matches!(err, DeliveryError::Http(_)));
    }
}
