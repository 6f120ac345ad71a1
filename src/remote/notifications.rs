use reqwest::Method;
use tracing::{info, warn};
use validator::Validate;

use super::client::JobApiClient;
use super::error::ApiError;
use super::models::{
    NotificationChannel, NotificationSettings, NotificationSettingsUpdate, TestNotificationResult,
};

/// Notification settings endpoints
impl JobApiClient {
    /// `GET /notifications/settings`
    pub async fn get_settings(&self) -> Result<NotificationSettings, ApiError> {
        self.send(Method::GET, "/notifications/settings", |req| req)
            .await
    }

    /// `PUT /notifications/settings`
    ///
    /// The update is validated first; an invalid update is never sent.
    pub async fn update_settings(
        &self,
        update: &NotificationSettingsUpdate,
    ) -> Result<NotificationSettings, ApiError> {
        if let Err(errors) = update.validate() {
            warn!("Refusing to send invalid settings update: {}", errors);
            return Err(ApiError::Validation(errors));
        }

        let settings: NotificationSettings = self
            .send(Method::PUT, "/notifications/settings", |req| req.json(update))
            .await?;
        info!("Notification settings saved (id={})", settings.id);
        Ok(settings)
    }

    /// `POST /notifications/test/{channel}`
    pub async fn send_test_notification(
        &self,
        channel: NotificationChannel,
    ) -> Result<TestNotificationResult, ApiError> {
        let path = format!("/notifications/test/{}", channel.as_str());
        let result: TestNotificationResult = self.send(Method::POST, &path, |req| req).await?;
        info!(
            "Test notification on {}: success={}",
            channel.as_str(),
            result.success
        );
        Ok(result)
    }
}
