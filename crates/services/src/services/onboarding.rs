//! First-sign-in experience: onboarding steps, profile completion and the
//! import of decks built before the user signed in.

use chrono::Utc;
use db::models::user::User;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use tracing::{info, warn};
use ts_rs::TS;

use super::deck::{DeckPayload, DeckService};

const NEW_USER_WINDOW_SECS: i64 = 5 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OnboardingStepId {
    Welcome,
    AvatarSelection,
    ProfileSetup,
    StartBuilding,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OnboardingStep {
    pub id: OnboardingStepId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub required: bool,
    pub action: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct ProfileCompletion {
    pub percentage: u8,
    pub has_avatar: bool,
    pub has_custom_name: bool,
    pub has_email: bool,
    pub is_complete: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OnboardingStatus {
    pub is_new_user: bool,
    pub needs_profile_setup: bool,
    pub steps: Vec<OnboardingStep>,
    pub profile_completion: ProfileCompletion,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct MigrationReport {
    pub total_decks: usize,
    pub migrated_count: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct OnboardingResult {
    #[serde(flatten)]
    pub status: OnboardingStatus,
    pub migration: Option<MigrationReport>,
}

pub fn is_new_user(user: &User) -> bool {
    (Utc::now() - user.created_at).num_seconds() < NEW_USER_WINDOW_SECS
}

pub fn needs_profile_setup(user: &User) -> bool {
    user.avatar.as_deref().is_none_or(str::is_empty)
}

/// The user picked a name other than the one derived from their email.
fn has_custom_name(user: &User) -> bool {
    let email_prefix = user.email.split('@').next().unwrap_or_default();
    !user.name.is_empty() && user.name != email_prefix
}

pub fn onboarding_steps(user: &User) -> Vec<OnboardingStep> {
    let mut steps = Vec::with_capacity(4);
    if is_new_user(user) {
        steps.push(OnboardingStep {
            id: OnboardingStepId::Welcome,
            title: "Welcome to Clash Royale Deck Builder!".to_string(),
            description: "Your Google account has been successfully connected.".to_string(),
            completed: true,
            required: false,
            action: None,
        });
    }
    if needs_profile_setup(user) {
        steps.push(OnboardingStep {
            id: OnboardingStepId::AvatarSelection,
            title: "Choose Your Avatar".to_string(),
            description: "Select a Clash Royale card as your profile avatar.".to_string(),
            completed: false,
            required: false,
            action: Some("select_avatar".to_string()),
        });
    }
    steps.push(OnboardingStep {
        id: OnboardingStepId::ProfileSetup,
        title: "Customize Your Profile".to_string(),
        description: "Update your display name and complete your profile.".to_string(),
        completed: has_custom_name(user),
        required: false,
        action: Some("edit_profile".to_string()),
    });
    steps.push(OnboardingStep {
        id: OnboardingStepId::StartBuilding,
        title: "Start Building Decks".to_string(),
        description: "Create your first deck and save it to your account.".to_string(),
        completed: false,
        required: false,
        action: Some("build_deck".to_string()),
    });
    steps
}

pub fn profile_completion(user: &User) -> ProfileCompletion {
    let has_avatar = !needs_profile_setup(user);
    let has_custom_name = has_custom_name(user);
    let has_email = !user.email.is_empty();
    let done = [has_avatar, has_custom_name, has_email]
        .iter()
        .filter(|done| **done)
        .count();
    let percentage = (done * 100 / 3) as u8;
    ProfileCompletion {
        percentage,
        has_avatar,
        has_custom_name,
        has_email,
        is_complete: done == 3,
    }
}

pub fn onboarding_status(user: &User) -> OnboardingStatus {
    OnboardingStatus {
        is_new_user: is_new_user(user),
        needs_profile_setup: needs_profile_setup(user),
        steps: onboarding_steps(user),
        profile_completion: profile_completion(user),
    }
}

#[derive(Clone)]
pub struct OnboardingService {
    decks: DeckService,
}

impl OnboardingService {
    pub fn new(decks: DeckService) -> Self {
        Self { decks }
    }

    /// Runs after every sign-in. Decks that fail to import are reported, never
    /// fatal.
    pub async fn handle_sign_in(
        &self,
        user: &User,
        anonymous_decks: Vec<serde_json::Value>,
    ) -> OnboardingResult {
        let migration = if anonymous_decks.is_empty() {
            None
        } else {
            Some(self.migrate_anonymous_decks(user, anonymous_decks).await)
        };
        OnboardingResult {
            status: onboarding_status(user),
            migration,
        }
    }

    async fn migrate_anonymous_decks(
        &self,
        user: &User,
        decks: Vec<serde_json::Value>,
    ) -> MigrationReport {
        let mut report = MigrationReport {
            total_decks: decks.len(),
            ..Default::default()
        };
        for (index, raw) in decks.into_iter().enumerate() {
            let outcome = match serde_json::from_value::<DeckPayload>(raw) {
                Ok(payload) => self.decks.create(user.id, payload).await.map_err(|e| e.to_string()),
                Err(e) => Err(format!("invalid deck data: {e}")),
            };
            match outcome {
                Ok(_) => report.migrated_count += 1,
                Err(reason) => {
                    let message = format!("Failed to migrate deck {}: {}", index + 1, reason);
                    warn!(user_id = %user.id, "{message}");
                    report.errors.push(message);
                }
            }
        }
        info!(
            user_id = %user.id,
            migrated = report.migrated_count,
            total = report.total_decks,
            "Anonymous deck migration finished"
        );
        report
    }
}
