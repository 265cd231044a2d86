use crate::framing::read_frame;
use crate::server::Context;
use bytes::BytesMut;
use menu_proto::*;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;
use tokio::sync::broadcast::error::RecvError;

pub async fn handle_sub_mode(
    s: &mut UnixStream,
    initial_payload: &[u8],
    ctx: &Context,
) -> anyhow::Result<()> {
    let key = match decode_key_only(initial_payload) {
        Ok(k) if validate_key(&k).is_ok() => k,
        Ok(_) => {
            ctx.metrics.inc_invalid_key();
            let resp = encode_response(Status::ErrInvalidKeyFormat, &[]);
            s.write_all(&resp).await?;
            return Ok(());
        }
        Err(_) => {
            let resp = encode_response(Status::ErrBadPayload, &[]);
            s.write_all(&resp).await?;
            return Ok(());
        }
    };

    let (current, mut rx) = ctx.snapshot_and_subscribe(&key);

    // Ack, then the current value right away
    s.write_all(&encode_response(Status::Ok, &[])).await?;
    s.write_all(&encode_push_frame(&current)).await?;
    tracing::debug!("Subscriber attached to {}", key);

    let mut buf = BytesMut::with_capacity(256);

    loop {
        tokio::select! {
            res = rx.recv() => {
                let ev = match res {
                    Ok(ev) => ev,
                    Err(RecvError::Lagged(n)) => {
                        // Skipped events are gone; the rest of the buffer still runs in commit order
                        ctx.metrics.inc_lagged();
                        tracing::warn!("Subscriber on {} lagged by {} events", key, n);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                };
                if s.write_all(&encode_push_frame(&ev)).await.is_err() {
                    break; // Client closed
                }
            }

            res = read_frame(s, ctx.cfg.max_frame_bytes, &mut buf) => {
                match res {
                    Ok(Some(frame)) => {
                        let Ok((code, _)) = split_frame(&frame) else { break };
                        match Opcode::from_u8(code) {
                            Some(Opcode::Unsubscribe) => {
                                let _ = s.write_all(&encode_response(Status::Ok, &[])).await;
                                break;
                            }
                            Some(Opcode::Ping) => {
                                let _ = s.write_all(&encode_response(Status::Ok, &[])).await;
                            }
                            _ => {
                                // push mode only understands UNSUBSCRIBE and PING
                            }
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }
        }
    }

    tracing::debug!("Subscriber detached from {}", key);
    Ok(())
}
