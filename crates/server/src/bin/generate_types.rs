use std::{fs, path::PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use ts_rs::TS;

/// Write the TypeScript definitions shared with the frontend.
#[derive(Debug, Parser)]
#[command(name = "generate_types")]
struct Args {
    #[arg(long, default_value = "shared/types.ts")]
    out: PathBuf,

    /// Fail if the file on disk is out of date instead of writing it
    #[arg(long)]
    check: bool,
}

fn generate_types_content() -> String {
    let header = "// This file was generated by `generate_types`. Do not edit it by hand.\n\n";
    let decls = [
        utils::response::ApiResponse::<(), ()>::decl(),
        utils::jwt::TokenType::decl(),
        deck::Card::decl(),
        deck::CardType::decl(),
        deck::Rarity::decl(),
        deck::DeckSlot::decl(),
        deck::SlotEdit::decl(),
        deck::DeckError::decl(),
        deck::DeckAnalysis::decl(),
        db::models::user::User::decl(),
        services::services::auth::TokenPair::decl(),
        services::services::auth::AccessToken::decl(),
        services::services::user::Profile::decl(),
        services::services::user::ProfileUpdate::decl(),
        services::services::deck::DeckPayload::decl(),
        services::services::deck::DeckSlotView::decl(),
        services::services::deck::DeckView::decl(),
        services::services::onboarding::OnboardingStepId::decl(),
        services::services::onboarding::OnboardingStep::decl(),
        services::services::onboarding::ProfileCompletion::decl(),
        services::services::onboarding::OnboardingStatus::decl(),
        services::services::onboarding::MigrationReport::decl(),
        services::services::onboarding::OnboardingResult::decl(),
        services::services::card_ingest::IngestReport::decl(),
        services::services::database_validator::ValidationResult::decl(),
        server::routes::health::HealthStatus::decl(),
        server::routes::auth::GoogleAuthRequest::decl(),
        server::routes::auth::RefreshRequest::decl(),
        server::routes::auth::AuthResponse::decl(),
        server::routes::deck_builder::ApplyEditRequest::decl(),
        server::routes::deck_builder::ApplyEditResponse::decl(),
        server::routes::deck_builder::AnalyzeRequest::decl(),
    ];
    let body = decls
        .into_iter()
        .map(|decl| format!("export {decl}"))
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{header}{body}\n")
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let generated = generate_types_content();

    if args.check {
        let current = fs::read_to_string(&args.out)
            .with_context(|| format!("failed to read {}", args.out.display()))?;
        if current != generated {
            bail!("{} is out of date, run generate_types", args.out.display());
        }
        println!("{} is up to date", args.out.display());
        return Ok(());
    }

    if let Some(parent) = args.out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.out, generated)?;
    println!("Wrote {}", args.out.display());
    Ok(())
}
