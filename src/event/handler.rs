use axum::Extension;
use axum::extract::ws::Message::{Close, Text};
use axum::extract::ws::WebSocket;
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use log::{debug, error, warn};

use crate::{auth, event};

pub async fn ws(
    Extension(auth_user): Extension<auth::User>,
    ws: WebSocketUpgrade,
    State(event_service): State<event::Service>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(auth_user, socket, event_service))
}

async fn handle_socket(auth_user: auth::User, ws: WebSocket, event_service: event::Service) {
    let subject = event::Subject::Notifications(auth_user.id());

    let mut notifications = match event_service.subscribe(&subject).await {
        Ok(stream) => stream,
        Err(e) => {
            error!("failed to subscribe to {subject}, aborting WS connection: {e:?}");
            return;
        }
    };

    let (mut sender, mut receiver) = ws.split();

    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                None | Some(Ok(Close(_))) => {
                    debug!("WS connection closed by client");
                    break;
                }
                Some(Err(e)) => {
                    error!("failed to read WS frame: {e:?}");
                    break;
                }
                Some(Ok(Text(content))) => warn!("ignoring inbound text frame: {content}"),
                Some(Ok(_)) => {}
            },

            noti = notifications.next() => {
                let Some(noti) = noti else {
                    debug!("notification stream of {subject} ended");
                    break;
                };

                let frame = match serde_json::to_string(&noti) {
                    Ok(frame) => frame,
                    Err(e) => {
                        error!("failed to serialize notification: {e:?}");
                        continue;
                    }
                };

                if let Err(e) = sender.send(Text(frame.into())).await {
                    error!("failed to send WS frame: {e:?}");
                    break;
                }
            }
        }
    }

    if let Err(e) = sender.close().await {
        debug!("WS sink already closed: {e:?}");
    }
}
