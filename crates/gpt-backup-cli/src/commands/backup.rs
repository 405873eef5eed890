use std::path::Path;

use anyhow::Result;
use gpt_backup_auth::{AuthError, SessionTokenProvider, StaticTokenProvider, TokenProvider};
use gpt_backup_core::{
    ArchiveSink, ChatGptClient, HarvestError, HarvestSettings, Harvester, JsonFileSink,
    ProgressEvent, ProgressSink, StdoutProgress,
};
use tracing::info;

use crate::ui;
use crate::BackupArgs;

pub async fn run(config_path: &Path, args: BackupArgs) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }

    let tokens: Box<dyn TokenProvider> = match (args.token, args.session_cookie) {
        (Some(token), _) => Box::new(StaticTokenProvider::new(token)),
        (None, Some(cookie)) => Box::new(SessionTokenProvider::new(config.session_url.clone(), cookie)),
        (None, None) => {
            return Err(HarvestError::Auth(AuthError::MissingCredentials(
                "pass --token or --session-cookie (or GPT_BACKUP_TOKEN / GPT_BACKUP_SESSION_COOKIE)"
                    .to_string(),
            ))
            .into())
        }
    };

    let client = ChatGptClient::from_config(&config)?;
    let progress: Box<dyn ProgressSink> = if args.bar {
        Box::new(ui::BarProgress::new())
    } else {
        Box::new(StdoutProgress)
    };

    info!("Using API at {}", config.api_base_url);
    let harvester = Harvester::new(
        tokens.as_ref(),
        &client,
        &client,
        progress.as_ref(),
        HarvestSettings::from(&config),
    );

    let conversations = match harvester.run(args.start_offset, args.stop_offset).await {
        Ok(conversations) => conversations,
        Err(e) => {
            ui::error(&format!("Backup failed: {}", e));
            return Err(e.into());
        }
    };

    let sink = JsonFileSink::new(&config.output_dir);
    let path = sink.save(&conversations).await?;
    progress.emit(ProgressEvent::Done);

    ui::success(&format!(
        "Saved {} conversations to {}",
        conversations.len(),
        path.display()
    ));
    Ok(())
}
