//! Per-connection pump: drives one pipe-pair over a pair of byte streams.
//!
//! Generic over the transport (`AsyncRead + AsyncWrite`) and the cache, so
//! the same pump drives real `tokio::net::TcpStream`s in the binary and
//! turmoil's simulated sockets in deterministic network tests.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use xcodec_core::{Cache, CacheUuid};
use xcodec_pipe::{PipeAction, PipePair};

use crate::error::ProxyError;

const READ_BUF_LEN: usize = 16 * 1024;

/// Constructs a pipe-pair joining `interface` and `peer` and pumps bytes
/// between them until both directions have completed an orderly shutdown.
///
/// # Errors
///
/// Returns a [`ProxyError`] on socket I/O failure or a protocol violation
/// from either direction's pipe-pair traffic.
pub async fn run_session<I, P, C>(
    connection_id: u64,
    mut interface: I,
    mut peer: P,
    local_uuid: CacheUuid,
    cache: C,
) -> Result<(), ProxyError>
where
    I: AsyncRead + AsyncWrite + Unpin,
    P: AsyncRead + AsyncWrite + Unpin,
    C: Cache,
{
    let mut pipe = PipePair::new(local_uuid, cache);
    let mut interface_buf = vec![0u8; READ_BUF_LEN];
    let mut peer_buf = vec![0u8; READ_BUF_LEN];

    let mut interface_read_open = true;
    let mut peer_read_open = true;

    while !pipe.is_closed() {
        tokio::select! {
            result = interface.read(&mut interface_buf), if interface_read_open => {
                let n = result?;
                let actions = if n == 0 {
                    interface_read_open = false;
                    tracing::debug!(connection_id, "interface read-side closed");
                    pipe.close_plaintext()?
                } else {
                    pipe.encode_plaintext(&interface_buf[..n])?
                };
                execute_actions(connection_id, actions, &mut interface, &mut peer).await?;
            },
            result = peer.read(&mut peer_buf), if peer_read_open => {
                let n = result?;
                let actions = if n == 0 {
                    peer_read_open = false;
                    tracing::debug!(connection_id, "peer read-side closed");
                    pipe.receive_wire_eof()?
                } else {
                    pipe.receive_wire_bytes(&peer_buf[..n])?
                };
                execute_actions(connection_id, actions, &mut interface, &mut peer).await?;
            },
            else => break,
        }
    }

    tracing::info!(connection_id, "session closed");
    Ok(())
}

async fn execute_actions<I, P>(
    connection_id: u64,
    actions: Vec<PipeAction>,
    interface: &mut I,
    peer: &mut P,
) -> Result<(), ProxyError>
where
    I: AsyncWrite + Unpin,
    P: AsyncWrite + Unpin,
{
    for action in actions {
        match action {
            PipeAction::SendWire(bytes) => peer.write_all(&bytes).await?,
            PipeAction::DeliverPlaintext(bytes) => interface.write_all(&bytes).await?,
            PipeAction::CloseWireOutbound => {
                tracing::debug!(connection_id, "closing wire-facing write side");
                peer.shutdown().await?;
            },
            PipeAction::ClosePlaintextOutbound => {
                tracing::debug!(connection_id, "closing interface-facing write side");
                interface.shutdown().await?;
            },
        }
    }
    Ok(())
}
