//! Settings entity <-> model mapper

use butler_core::entities::Settings;

use crate::models::SettingsModel;

impl From<SettingsModel> for Settings {
    fn from(model: SettingsModel) -> Self {
        Settings {
            id: model.id,
            delete_message_days_when_banned: model.delete_message_days_when_banned,
            created_at: model.created_at,
            modified_at: model.modified_at,
        }
    }
}
