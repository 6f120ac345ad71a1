use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use super::form::{self, validation_messages};
use super::{settle, Banner, QueryState};
use crate::query::JobQuery;
use crate::remote::models::DEFAULT_NOTIFY_INTERVAL_HOURS;
use crate::remote::{ApiError, NotificationChannel, NotificationSettings, NotificationSettingsUpdate};
use crate::state::AppState;

pub const SETTINGS_PAGE: &str = "settings";

/// Settings form as typed by the user, before any parsing.
///
/// Credentials are write-only: the token and webhook fields start blank and a
/// blank value leaves the stored credential unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsDraft {
    #[serde(default, deserialize_with = "form::checkbox")]
    pub email_enabled: bool,
    #[serde(default)]
    pub email_address: String,
    #[serde(default, deserialize_with = "form::checkbox")]
    pub line_enabled: bool,
    #[serde(default)]
    pub line_token: String,
    #[serde(default, deserialize_with = "form::checkbox")]
    pub slack_enabled: bool,
    #[serde(default)]
    pub slack_webhook_url: String,
    #[serde(default)]
    pub min_price_threshold: String,
    #[serde(default)]
    pub skills_filter: String,
    #[serde(default, deserialize_with = "form::checkbox")]
    pub remote_only: bool,
    #[serde(default)]
    pub notify_interval_hours: String,
}

impl Default for SettingsDraft {
    fn default() -> Self {
        SettingsDraft {
            email_enabled: false,
            email_address: String::new(),
            line_enabled: false,
            line_token: String::new(),
            slack_enabled: false,
            slack_webhook_url: String::new(),
            min_price_threshold: String::new(),
            skills_filter: String::new(),
            remote_only: false,
            notify_interval_hours: DEFAULT_NOTIFY_INTERVAL_HOURS.to_string(),
        }
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl SettingsDraft {
    pub fn from_settings(settings: &NotificationSettings) -> Self {
        SettingsDraft {
            email_enabled: settings.email_enabled,
            email_address: settings.email_address.clone().unwrap_or_default(),
            line_enabled: settings.line_enabled,
            line_token: String::new(),
            slack_enabled: settings.slack_enabled,
            slack_webhook_url: String::new(),
            min_price_threshold: settings
                .min_price_threshold
                .map(|p| p.to_string())
                .unwrap_or_default(),
            skills_filter: settings.skills_filter.clone().unwrap_or_default(),
            remote_only: settings.remote_only,
            notify_interval_hours: settings.notify_interval_hours.to_string(),
        }
    }

    /// Parse and validate the draft into the update sent to the backend
    pub fn to_update(&self) -> Result<NotificationSettingsUpdate, Vec<String>> {
        let min_price_threshold = match non_blank(&self.min_price_threshold) {
            Some(value) => match value.parse::<i32>() {
                Ok(price) => Some(price),
                Err(_) => return Err(vec!["Minimum price must be a whole number".to_string()]),
            },
            None => None,
        };
        // An unreadable interval falls back to the default rather than failing.
        let notify_interval_hours = self
            .notify_interval_hours
            .trim()
            .parse::<u32>()
            .unwrap_or(DEFAULT_NOTIFY_INTERVAL_HOURS);

        let update = NotificationSettingsUpdate {
            email_enabled: self.email_enabled,
            email_address: non_blank(&self.email_address),
            line_enabled: self.line_enabled,
            line_token: non_blank(&self.line_token),
            slack_enabled: self.slack_enabled,
            slack_webhook_url: non_blank(&self.slack_webhook_url),
            min_price_threshold,
            skills_filter: non_blank(&self.skills_filter),
            remote_only: self.remote_only,
            notify_interval_hours,
        };

        update
            .validate()
            .map_err(|errors| validation_messages(&errors))?;
        Ok(update)
    }

    /// Copy without credentials, for re-rendering the form
    pub fn without_credentials(&self) -> Self {
        SettingsDraft {
            line_token: String::new(),
            slack_webhook_url: String::new(),
            ..self.clone()
        }
    }
}

pub struct SettingsView {
    pub settings: QueryState<NotificationSettings>,
    pub draft: SettingsDraft,
    pub banner: Option<Banner>,
    pub errors: Vec<String>,
}

impl SettingsView {
    fn loaded(settings: QueryState<NotificationSettings>, banner: Option<Banner>) -> Self {
        let draft = settings
            .ready()
            .map(SettingsDraft::from_settings)
            .unwrap_or_default();
        SettingsView {
            settings,
            draft,
            banner,
            errors: Vec::new(),
        }
    }
}

async fn current(app: &AppState) -> QueryState<NotificationSettings> {
    app.views.show(SETTINGS_PAGE, &app.queries, &JobQuery::Settings);
    settle(app.render_timeout, app.queries.settings()).await
}

pub async fn load(app: &AppState) -> SettingsView {
    SettingsView::loaded(current(app).await, None)
}

/// Save the draft as one wholesale update. An invalid draft is shown again
/// with its errors and nothing is sent.
pub async fn save(app: &AppState, draft: SettingsDraft) -> SettingsView {
    let update = match draft.to_update() {
        Ok(update) => update,
        Err(errors) => {
            warn!("Rejected settings draft: {}", errors.join("; "));
            return SettingsView {
                settings: current(app).await,
                draft: draft.without_credentials(),
                banner: Some(Banner::failure("Please fix the highlighted settings.")),
                errors,
            };
        }
    };

    match app.queries.save_settings(&update).await {
        Ok(_) => {
            info!("Notification settings saved");
            SettingsView::loaded(current(app).await, Some(Banner::success("Settings saved.")))
        }
        Err(e) => {
            warn!("Failed to save notification settings: {}", e);
            SettingsView {
                settings: current(app).await,
                draft: draft.without_credentials(),
                banner: Some(Banner::failure("Failed to save settings.")),
                errors: save_errors(&e),
            }
        }
    }
}

fn save_errors(err: &ApiError) -> Vec<String> {
    match err {
        ApiError::Validation(errors) => validation_messages(errors),
        _ => Vec::new(),
    }
}

/// Fire a test notification. The call is isolated from the cache and only
/// its outcome is reported.
pub async fn send_test(app: &AppState, channel: NotificationChannel) -> SettingsView {
    let banner = match app.queries.api().send_test_notification(channel).await {
        Ok(result) => {
            info!(
                "Test notification on {}: success={}",
                channel.as_str(),
                result.success
            );
            Banner {
                success: result.success,
                message: result.message,
            }
        }
        Err(e) => {
            warn!("Test notification on {} failed: {}", channel.as_str(), e);
            Banner::failure("Failed to send the test notification.")
        }
    };
    SettingsView::loaded(current(app).await, Some(banner))
}
