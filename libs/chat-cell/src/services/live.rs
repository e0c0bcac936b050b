use axum::extract::ws::{Message as WsMessage, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_utils::realtime::ConversationHub;

/// Forwards every hub notification for the conversation to the socket until
/// either side goes away. Client frames other than close are ignored.
pub async fn stream_conversation(socket: WebSocket, hub: ConversationHub, conversation_id: Uuid) {
    let mut notifications = hub.subscribe(conversation_id).await;
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            notification = notifications.recv() => match notification {
                Ok(text) => {
                    if sender.send(WsMessage::Text(text.into())).await.is_err() {
                        debug!("Live viewer of {} went away", ConversationHub::topic(conversation_id));
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Live viewer of {} skipped {} notifications", ConversationHub::topic(conversation_id), skipped);
                }
                Err(RecvError::Closed) => break,
            },
            frame = receiver.next() => match frame {
                Some(Ok(WsMessage::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    drop(notifications);
    hub.release(conversation_id).await;
}
