//! Player directory port
//!
//! Resolves the public Riot ID (`gameName#tagLine`) of a player known only
//! by PUUID.

use serde::{Deserialize, Serialize};

use crate::domain::Puuid;

/// Public account identity of a player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerAccount {
    pub puuid: Puuid,
    pub game_name: String,
    pub tag_line: String,
}

impl PlayerAccount {
    /// `gameName#tagLine`
    #[must_use]
    pub fn riot_id(&self) -> String {
        format!("{}#{}", self.game_name, self.tag_line)
    }
}

#[async_trait::async_trait]
pub trait IPlayerDirectory: Send + Sync {
    async fn get_account(&self, puuid: &Puuid) -> anyhow::Result<PlayerAccount>;
}
