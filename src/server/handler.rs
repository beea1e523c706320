//! Server event hooks
//!
//! `SignalHandler` lets an application observe connections and veto joins.
//! Every method has a default, so `impl SignalHandler for MyHandler {}` is a
//! valid handler. Implementations may use `async fn`.

use std::future::Future;
use std::net::SocketAddr;

use crate::protocol::{ChatMessage, ConnId, LinkId, RoomId};

/// Connection details passed to handler callbacks
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    /// Server-assigned connection identifier
    pub conn_id: ConnId,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Room the connection is currently in
    pub room_id: Option<RoomId>,

    /// Link identifier announced in the last successful join
    pub link_id: Option<LinkId>,
}

impl ConnectionContext {
    pub fn new(conn_id: ConnId, peer_addr: SocketAddr) -> Self {
        Self {
            conn_id,
            peer_addr,
            room_id: None,
            link_id: None,
        }
    }
}

/// Decision returned by `SignalHandler::on_join`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    Accept,
    /// Refuse the join; the reason is sent back as an `error` message
    Reject(String),
}

/// Application callbacks for the signaling server
pub trait SignalHandler: Send + Sync + 'static {
    /// A TCP connection was accepted. Return false to close it immediately.
    fn on_connection(&self, _ctx: &ConnectionContext) -> impl Future<Output = bool> + Send {
        async { true }
    }

    /// A connection asked to join a room
    fn on_join(
        &self,
        _ctx: &ConnectionContext,
        _room_id: &RoomId,
        _name: &str,
    ) -> impl Future<Output = Admission> + Send {
        async { Admission::Accept }
    }

    /// A chat message was relayed
    fn on_chat(
        &self,
        _ctx: &ConnectionContext,
        _message: &ChatMessage,
    ) -> impl Future<Output = ()> + Send {
        async {}
    }

    /// The connection closed and its membership was cleaned up
    fn on_disconnect(&self, _ctx: &ConnectionContext) -> impl Future<Output = ()> + Send {
        async {}
    }
}

/// Handler that accepts everything and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultHandler;

impl SignalHandler for DefaultHandler {}
