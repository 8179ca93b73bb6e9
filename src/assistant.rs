//! Bridge from recognized speech into list operations.
//!
//! The speech session's event channel is the only path recognized text
//! takes into list building: finalized transcripts are parsed into
//! commands and applied to the store; everything else is logged.

use crate::list::{self, ListStore, VoiceCommand};
use crate::speech::SessionEvent;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Consume session events until the session goes away.
pub async fn run(mut events: mpsc::UnboundedReceiver<SessionEvent>, store: Arc<ListStore>) {
    while let Some(event) = events.recv().await {
        match event {
            SessionEvent::Transcript {
                text,
                is_final: true,
            } => match list::parse(&text) {
                Some(command) => {
                    if let Err(e) = apply(&store, command).await {
                        warn!("failed to apply voice command: {}", e);
                    }
                }
                None => debug!("no command recognized in: {}", text),
            },
            SessionEvent::Transcript {
                text,
                is_final: false,
            } => {
                debug!("interim: {}", text);
            }
            SessionEvent::Ended => debug!("speech session ended on its own"),
            SessionEvent::Error(kind) => warn!("speech session error: {}", kind),
        }
    }
    debug!("session event stream closed");
}

async fn apply(store: &ListStore, command: VoiceCommand) -> Result<()> {
    match command {
        VoiceCommand::Add { name, quantity } => {
            let item = store.add_item(&name, quantity).await?;
            info!("added {} (x{})", item.name, item.quantity);
        }
        VoiceCommand::Remove { name } => match store.remove_item_by_name(&name).await? {
            Some(item) => info!("removed {}", item.name),
            None => debug!("nothing on the list matching: {}", name),
        },
        VoiceCommand::Complete { name } => match store.complete_by_name(&name).await? {
            Some(item) => info!("checked off {}", item.name),
            None => debug!("nothing on the list matching: {}", name),
        },
        VoiceCommand::Clear => {
            let removed = store.clear().await?;
            info!("cleared the list ({} items)", removed);
        }
        VoiceCommand::ClearCompleted => {
            let removed = store.clear_completed().await?;
            info!("cleared {} completed items", removed);
        }
    }
    Ok(())
}
