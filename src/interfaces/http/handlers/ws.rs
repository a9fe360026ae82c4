//! `GET /ws` (spec §6): client authenticates with a token, then sends
//! subscribe messages `{type:"subscribe", channel, symbol?}`; server pushes
//! typed frames. Grounded on `orc2626-tech-sBot9999`'s `api::ws` connection
//! handler (query-param token auth before upgrade, `tokio::select!` over a
//! push side and a recv side, Ping/Pong handling, cleanup on disconnect),
//! generalized from its single always-on state-push loop to several
//! independently (un)subscribable channels per spec §4.9.

use crate::application::bootstrap::AppContext;
use crate::application::streaming::SystemEvent;
use crate::domain::notification::Notification;
use crate::domain::quote::Quote;
use crate::domain::trade::Trade;
use crate::interfaces::http::auth::decode_subject;
use crate::interfaces::http::dto::{NotificationDto, QuoteResponse, TradeResponse};
use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

#[derive(Deserialize)]
pub struct WsQuery {
    token: Option<String>,
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { channel: String, #[serde(default)] symbol: Option<String> },
    Unsubscribe { channel: String },
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame<'a> {
    Price { symbol: &'a str, quote: QuoteResponse },
    Trade { trade: TradeResponse },
    Notification { notification: NotificationDto },
    System { kind: String, detail: serde_json::Value },
    Error { message: String },
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(ctx): State<Arc<AppContext>>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    let token = query.token.unwrap_or_default();
    let owner_id = match decode_subject(&ctx.config.server.jwt_secret, &token) {
        Ok(id) => id,
        Err(_) => {
            warn!("WebSocket connection rejected: invalid or missing token");
            return (axum::http::StatusCode::UNAUTHORIZED, "invalid or missing token").into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_connection(socket, ctx, owner_id)).into_response()
}

async fn handle_connection(socket: WebSocket, ctx: Arc<AppContext>, owner_id: String) {
    let (mut sender, mut receiver) = socket.split();

    let mut trades_rx: mpsc::Receiver<Trade> = ctx.fanout.subscribe_trades(&owner_id);
    let mut notifications_rx: mpsc::Receiver<Notification> = ctx.fanout.subscribe_notifications(&owner_id);
    let mut system_rx: broadcast::Receiver<SystemEvent> = ctx.fanout.subscribe_system();
    let mut price_rx: Option<broadcast::Receiver<Quote>> = None;
    let mut price_symbol: Option<String> = None;

    loop {
        tokio::select! {
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Subscribe { channel, symbol }) if channel == "prices" => {
                                if let Some(symbol) = symbol {
                                    price_rx = Some(ctx.fanout.subscribe_price(&symbol));
                                    price_symbol = Some(symbol);
                                }
                            }
                            Ok(ClientMessage::Unsubscribe { channel }) if channel == "prices" => {
                                price_rx = None;
                                price_symbol = None;
                            }
                            Ok(_) => {
                                // trades/notifications/system are always-on per owner; nothing to do.
                            }
                            Err(e) => {
                                let frame = ServerFrame::Error { message: format!("malformed message: {e}") };
                                if send_frame(&mut sender, &frame).await.is_err() {
                                    break;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        debug!(error = %e, "WebSocket receive error");
                        break;
                    }
                }
            }

            Some(trade) = trades_rx.recv() => {
                let frame = ServerFrame::Trade { trade: trade.into() };
                if send_frame(&mut sender, &frame).await.is_err() {
                    break;
                }
            }

            Some(notification) = notifications_rx.recv() => {
                let frame = ServerFrame::Notification { notification: notification.into() };
                if send_frame(&mut sender, &frame).await.is_err() {
                    break;
                }
            }

            Ok(event) = system_rx.recv() => {
                let frame = ServerFrame::System { kind: event.kind, detail: event.detail };
                if send_frame(&mut sender, &frame).await.is_err() {
                    break;
                }
            }

            Ok(quote) = async {
                match &mut price_rx {
                    Some(rx) => rx.recv().await,
                    None => std::future::pending().await,
                }
            }, if price_rx.is_some() => {
                if let Some(symbol) = &price_symbol {
                    let frame = ServerFrame::Price { symbol, quote: quote.into() };
                    if send_frame(&mut sender, &frame).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

async fn send_frame(
    sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    frame: &ServerFrame<'_>,
) -> Result<(), axum::Error> {
    match serde_json::to_string(frame) {
        Ok(json) => sender.send(Message::Text(json.into())).await,
        Err(e) => {
            warn!(error = %e, "failed to serialize outbound WebSocket frame");
            Ok(())
        }
    }
}
