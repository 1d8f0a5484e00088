use crate::bot::dispatcher::Dispatcher;
use crate::config::BotConfig;
use crate::error::Result;
use crate::pdf::CertificateRenderer;
use crate::telegram::BotClient;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

/// Pause nach einem fehlgeschlagenen getUpdates
const POLL_PAUSE: Duration = Duration::from_secs(1);

/// Startet den Bot und pollt, bis Ctrl-C gedrückt wird. Laufende Antworten
/// werden vor dem Beenden noch abgeschlossen.
pub async fn run(config: BotConfig) -> Result<()> {
    info!("Starting bot with {:?}", config);

    let renderer = CertificateRenderer::open(&config.template)?;
    let client = Arc::new(BotClient::new(
        &config.token,
        &config.api_url,
        config.poll_timeout,
    )?);

    let me = client.get_me().await?;
    info!(
        "Logged in as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    let dispatcher = Arc::new(Dispatcher::from_config(&config, renderer)?.bot_username(me.username));

    let mut offset = 0;
    let mut tasks = JoinSet::new();
    loop {
        while let Some(finished) = tasks.try_join_next() {
            log_task_result(finished);
        }

        let polled = tokio::select! {
            polled = client.get_updates(offset) => polled,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        };

        let batch = match polled {
            Ok(batch) => batch,
            Err(e) => {
                warn!("Polling failed: {}", e);
                tokio::time::sleep(POLL_PAUSE).await;
                continue;
            }
        };
        offset = batch.next_offset(offset);

        for update in batch.updates {
            let client = Arc::clone(&client);
            let dispatcher = Arc::clone(&dispatcher);
            tasks.spawn(async move {
                if let Err(e) = dispatcher.handle_update(client.as_ref(), &update).await {
                    warn!("Update \"{:?}\" caused error \"{}\"", update, e);
                }
            });
        }
    }

    drain(&mut tasks).await;
    Ok(())
}

/// Wartet auf alle noch laufenden Update-Tasks
async fn drain(tasks: &mut JoinSet<()>) {
    if !tasks.is_empty() {
        info!("Waiting for {} pending updates", tasks.len());
    }
    while let Some(finished) = tasks.join_next().await {
        log_task_result(finished);
    }
}

fn log_task_result(result: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        warn!("Update task failed: {}", e);
    }
}
