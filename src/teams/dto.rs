use serde::Serialize;

/// Legacy connector card accepted by Teams incoming webhooks.
#[derive(Debug, Serialize)]
pub struct MessageCard {
    #[serde(rename = "@type")]
    pub card_type: &'static str,
    #[serde(rename = "@context")]
    pub context: &'static str,
    pub summary: String,
    #[serde(rename = "themeColor")]
    pub theme_color: &'static str,
    pub title: String,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct Section {
    #[serde(rename = "activityTitle")]
    pub activity_title: String,
    #[serde(rename = "activitySubtitle")]
    pub activity_subtitle: String,
    pub text: String,
}

impl MessageCard {
    pub fn notification(text: &str, sent_at: &str) -> Self {
        Self {
            card_type: "MessageCard",
            context: "https://schema.org/extensions",
            summary: "School Admin Notification".to_string(),
            theme_color: "6264A7",
            title: "School Admin Panel".to_string(),
            sections: vec![Section {
                activity_title: "New Message".to_string(),
                activity_subtitle: sent_at.to_string(),
                text: text.to_string(),
            }],
        }
    }
}
