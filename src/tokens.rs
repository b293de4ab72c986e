use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const MAX_TOKENS: u32 = 10;

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerFile {
    tokens: u32,
    player: Option<String>,
    last_login_day: Option<u64>,
}

/// The persistent token ledger. The game engine never touches it; games
/// report `tokens_earned` through their end callback and the hub applies it
/// here. The balance is clamped to [0, MAX_TOKENS].
pub struct TokenLedger {
    tokens: u32,
    player: Option<String>,
    last_login_day: Option<u64>,
    path: PathBuf,
}

impl TokenLedger {
    pub fn load() -> Self {
        Self::load_from(Self::ledger_path())
    }

    fn load_from(path: PathBuf) -> Self {
        let file: LedgerFile = fs::read_to_string(&path)
            .ok()
            .and_then(|data| serde_json::from_str(&data).ok())
            .unwrap_or_default();
        Self {
            tokens: file.tokens.min(MAX_TOKENS),
            player: file.player,
            last_login_day: file.last_login_day,
            path,
        }
    }

    fn ledger_path() -> PathBuf {
        // Store next to the executable
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                return dir.join("tokencade.json");
            }
        }
        PathBuf::from("tokencade.json")
    }

    pub fn tokens(&self) -> u32 {
        self.tokens
    }

    pub fn player(&self) -> Option<&str> {
        self.player.as_deref()
    }

    pub fn has_tokens(&self) -> bool {
        self.tokens > 0
    }

    /// Set the balance, clamped to [0, MAX_TOKENS]. Returns the new balance.
    pub fn set(&mut self, amount: i64) -> u32 {
        self.tokens = amount.clamp(0, MAX_TOKENS as i64) as u32;
        self.save();
        self.tokens
    }

    pub fn add(&mut self, amount: u32) -> u32 {
        self.set(self.tokens as i64 + amount as i64)
    }

    /// Spend one token. Returns false when the balance is empty.
    pub fn spend(&mut self) -> bool {
        if self.tokens == 0 {
            return false;
        }
        self.set(self.tokens as i64 - 1);
        true
    }

    pub fn reset(&mut self) -> u32 {
        self.set(0)
    }

    /// Record a login and return the bonus granted: one welcome token for a
    /// new player, one daily token on the first login of a day.
    pub fn record_login(&mut self, name: &str) -> u32 {
        let today = Self::today();
        let bonus = if self.player.as_deref() != Some(name) {
            1
        } else if self.last_login_day != Some(today) {
            1
        } else {
            0
        };
        self.player = Some(name.to_string());
        self.last_login_day = Some(today);
        if bonus > 0 {
            self.add(bonus);
        } else {
            self.save();
        }
        bonus
    }

    fn today() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() / 86_400)
            .unwrap_or(0)
    }

    fn save(&self) {
        let file = LedgerFile {
            tokens: self.tokens,
            player: self.player.clone(),
            last_login_day: self.last_login_day,
        };
        match serde_json::to_string_pretty(&file) {
            Ok(json) => {
                let _ = fs::write(&self.path, json);
            }
            Err(err) => warn!(%err, "failed to encode token ledger"),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn scratch_ledger() -> TokenLedger {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!(
            "tokencade-test-{}-{}.json",
            std::process::id(),
            n
        ));
        let _ = fs::remove_file(&path);
        TokenLedger::load_from(path)
    }

    #[test]
    fn balance_clamps_to_the_valid_range() {
        let mut ledger = scratch_ledger();
        assert_eq!(ledger.set(25), MAX_TOKENS);
        assert_eq!(ledger.set(-3), 0);
        assert_eq!(ledger.set(7), 7);
        assert_eq!(ledger.add(9), MAX_TOKENS);
    }

    #[test]
    fn spend_fails_on_an_empty_balance() {
        let mut ledger = scratch_ledger();
        assert!(!ledger.spend());
        ledger.set(2);
        assert!(ledger.spend());
        assert!(ledger.spend());
        assert!(!ledger.spend());
        assert!(!ledger.has_tokens());
    }

    #[test]
    fn reset_zeroes_the_balance() {
        let mut ledger = scratch_ledger();
        ledger.set(5);
        assert_eq!(ledger.reset(), 0);
        assert_eq!(ledger.tokens(), 0);
    }

    #[test]
    fn login_grants_welcome_then_daily_token_once() {
        let mut ledger = scratch_ledger();
        assert_eq!(ledger.record_login("AVA"), 1); // welcome
        assert_eq!(ledger.record_login("AVA"), 0); // same day, nothing more
        assert_eq!(ledger.tokens(), 1);
        assert_eq!(ledger.player(), Some("AVA"));
        // A different name counts as a new player.
        assert_eq!(ledger.record_login("SAM"), 1);
        assert_eq!(ledger.tokens(), 2);
    }

    #[test]
    fn ledger_round_trips_through_its_file() {
        let mut ledger = scratch_ledger();
        ledger.set(4);
        ledger.record_login("AVA");
        let path = ledger.path.clone();
        let reloaded = TokenLedger::load_from(path.clone());
        assert_eq!(reloaded.tokens(), 5);
        assert_eq!(reloaded.player(), Some("AVA"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn a_corrupt_file_loads_as_an_empty_ledger() {
        let mut ledger = scratch_ledger();
        ledger.set(3);
        fs::write(&ledger.path, b"not json").unwrap();
        let reloaded = TokenLedger::load_from(ledger.path.clone());
        assert_eq!(reloaded.tokens(), 0);
        assert_eq!(reloaded.player(), None);
        let _ = fs::remove_file(&ledger.path);
    }
}
