use serde::{Deserialize, Serialize};

/// Single decrypted stream link together with its human readable quality
/// label ("1080p", "720p", or "auto" when recovered by the fallback scan).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedLink {
    pub quality: String,
    pub link: String,
}

/// Outcome of the player page strategy. `plyr_link` is the secondary player
/// page discovered on the source page, `master_link` the selected manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLinks {
    pub master_link: Option<String>,
    pub plyr_link: Option<String>,
}

impl PlayerLinks {
    pub fn is_empty(&self) -> bool {
        self.master_link.is_none() && self.plyr_link.is_none()
    }
}

/// What a single extraction call produced, depending on which page shape
/// was detected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractOutcome {
    Links(Vec<ExtractedLink>),
    Player(PlayerLinks),
}

impl ExtractOutcome {
    pub fn is_empty(&self) -> bool {
        match self {
            ExtractOutcome::Links(links) => links.is_empty(),
            ExtractOutcome::Player(player) => player.is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_serialize_extracted_link() {
        let link = ExtractedLink {
            quality: "720p".into(),
            link: "u2".into(),
        };
        assert_eq!(
            serde_json::to_value(&link).unwrap(),
            serde_json::json!({ "quality": "720p", "link": "u2" })
        );
    }

    #[test]
    fn should_serialize_empty_player_links_as_nulls() {
        assert_eq!(
            serde_json::to_value(PlayerLinks::default()).unwrap(),
            serde_json::json!({ "masterLink": null, "plyrLink": null })
        );
    }
}
