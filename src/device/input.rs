use rand::thread_rng;
use serde::{Deserialize, Serialize};

use super::driver::Driver;
use super::gesture::{plan_swipe, Direction, SwipePlan};
use crate::error::Result;
use crate::hierarchy::Bounds;

/// Hold time for a long press, in milliseconds
pub const LONG_TAP_DURATION_MS: u64 = 800;

/// Ratio of the screen covered by a full-screen swipe
pub const SCREEN_SWIPE_RATIO: f64 = 0.5;

/// IME editor actions understood by the broadcast keyboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorAction {
    Go,
    Search,
    Send,
    Next,
    Done,
    Previous,
}

impl EditorAction {
    /// Android `EditorInfo.IME_ACTION_*` code
    pub fn code(self) -> i32 {
        match self {
            EditorAction::Go => 2,
            EditorAction::Search => 3,
            EditorAction::Send => 4,
            EditorAction::Next => 5,
            EditorAction::Done => 6,
            EditorAction::Previous => 7,
        }
    }
}

impl Driver {
    // ============ Touch ============

    pub async fn tap(&self, x: i32, y: i32) -> Result<()> {
        self.run("input", &["tap".to_string(), x.to_string(), y.to_string()])
            .await?;
        Ok(())
    }

    pub async fn long_tap(&self, x: i32, y: i32) -> Result<()> {
        let (x, y) = (x.to_string(), y.to_string());
        self.run(
            "input",
            &[
                "swipe".to_string(),
                x.clone(),
                y.clone(),
                x,
                y,
                LONG_TAP_DURATION_MS.to_string(),
            ],
        )
        .await?;
        Ok(())
    }

    /// Swipe across the whole screen
    pub async fn swipe(&self, direction: Direction) -> Result<SwipePlan> {
        let (width, height) = self.resolution().await?;
        self.swipe_in_range(&Bounds::from_size(width, height), direction, 0, SCREEN_SWIPE_RATIO)
            .await
    }

    /// Swipe inside `bounds`, covering `ratio` of its extent
    pub async fn swipe_in_range(
        &self,
        bounds: &Bounds,
        direction: Direction,
        duration_ms: u64,
        ratio: f64,
    ) -> Result<SwipePlan> {
        let plan = plan_swipe(&mut thread_rng(), bounds, direction, duration_ms, ratio);
        tracing::debug!(%direction, ?plan, "Swiping");
        self.run("input", plan.to_args().as_slice()).await?;
        Ok(plan)
    }

    // ============ Text ============

    /// Focus the field at `(x, y)`, clear it and type `text` through the
    /// broadcast keyboard, then restore the default keyboard
    pub async fn input_text(&self, x: i32, y: i32, text: &str) -> Result<()> {
        self.switch_to_adb_keyboard().await?;

        let typed = async {
            self.tap(x, y).await?;
            self.clear_text().await?;
            self.run(
                "am",
                &[
                    "broadcast".to_string(),
                    "-a".to_string(),
                    "STAR_INPUT_TEXT".to_string(),
                    "--es".to_string(),
                    "msg".to_string(),
                    shell_quote(text),
                ],
            )
            .await
        }
        .await;

        if let Err(e) = self.switch_to_default_keyboard().await {
            tracing::warn!("Failed to restore default input method: {}", e);
        }
        typed.map(|_| ())
    }

    pub async fn clear_text(&self) -> Result<()> {
        self.run("am", &["broadcast", "-a", "STAR_CLEAR_TEXT"]).await?;
        Ok(())
    }

    pub async fn editor_action(&self, action: EditorAction) -> Result<()> {
        self.run(
            "am",
            &[
                "broadcast".to_string(),
                "-a".to_string(),
                "STAR_EDITOR_CODE".to_string(),
                "--ei".to_string(),
                "code".to_string(),
                action.code().to_string(),
            ],
        )
        .await?;
        Ok(())
    }

    // ============ Input methods ============

    pub async fn current_ime(&self) -> Result<String> {
        self.run("settings", &["get", "secure", "default_input_method"])
            .await
    }

    /// Switch to `ime`; `false` when the device refused
    pub async fn switch_ime(&self, ime: &str) -> Result<bool> {
        match self.run("ime", &["set", ime]).await {
            Ok(_) => Ok(true),
            Err(e) if e.output().is_some() => {
                tracing::warn!(ime, "Failed to switch input method: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn switch_to_adb_keyboard(&self) -> Result<bool> {
        let keyboard = self.config().adb_keyboard.clone();
        self.switch_ime(&keyboard).await
    }

    /// Restore the input method cached by `initialize`
    pub async fn switch_to_default_keyboard(&self) -> Result<bool> {
        match self.session().default_ime().await {
            Some(ime) if !ime.is_empty() => self.switch_ime(&ime).await,
            _ => Ok(false),
        }
    }
}

/// Single-quote `text` for the device shell
fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
