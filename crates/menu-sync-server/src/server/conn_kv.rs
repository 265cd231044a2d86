use crate::framing::read_frame;
use crate::server::Context;
use bytes::BytesMut;
use menu_proto::*;
use tokio::io::AsyncWriteExt;
use tokio::net::UnixStream;

pub async fn handle_conn(stream: &mut UnixStream, ctx: &Context) -> anyhow::Result<()> {
    let mut buf = BytesMut::with_capacity(4096);

    loop {
        let frame = match read_frame(stream, ctx.cfg.max_frame_bytes, &mut buf).await {
            Ok(Some(f)) => f,
            Ok(None) => return Ok(()), // EOF
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                let resp = encode_response(Status::ErrTooLarge, &[]);
                stream.write_all(&resp).await?;
                return Err(e.into());
            }
            Err(e) => return Err(e.into()),
        };

        // Backpressure: hold a permit while the request is processed
        let _permit = ctx
            .op_semaphore
            .acquire()
            .await
            .map_err(|_| std::io::Error::other("Semaphore closed"))?;

        let (code, payload) = split_frame(&frame)?;

        match Opcode::from_u8(code) {
            Some(Opcode::Set) => handle_set(stream, payload, ctx).await?,
            Some(Opcode::Get) => handle_get(stream, payload, ctx).await?,
            Some(Opcode::Del) => handle_del(stream, payload, ctx).await?,
            Some(Opcode::Ping) => {
                let resp = encode_response(Status::Ok, &[]);
                stream.write_all(&resp).await?;
            }
            Some(Opcode::Stats) => handle_stats(stream, ctx).await?,
            Some(Opcode::Subscribe) => {
                drop(_permit);
                // Push mode owns the stream until the client unsubscribes or disconnects.
                crate::server::conn_sub::handle_sub_mode(stream, payload, ctx).await?;
                return Ok(());
            }
            Some(Opcode::Unsubscribe) | None => {
                let resp = encode_response(Status::ErrUnknownOp, &[]);
                stream.write_all(&resp).await?;
            }
        }
    }
}

/// Decodes and validates the key, answering the client itself on failure.
async fn key_or_reply(
    s: &mut UnixStream,
    decoded: Result<String, ProtoError>,
    ctx: &Context,
) -> std::io::Result<Option<String>> {
    let key = match decoded {
        Ok(k) => k,
        Err(_) => {
            let resp = encode_response(Status::ErrBadPayload, &[]);
            s.write_all(&resp).await?;
            return Ok(None);
        }
    };
    if validate_key(&key).is_err() {
        ctx.metrics.inc_invalid_key();
        let resp = encode_response(Status::ErrInvalidKeyFormat, &[]);
        s.write_all(&resp).await?;
        return Ok(None);
    }
    Ok(Some(key))
}

async fn handle_set(s: &mut UnixStream, payload: &[u8], ctx: &Context) -> std::io::Result<()> {
    let req = match decode_set_payload(payload) {
        Ok(r) => r,
        Err(_) => {
            let resp = encode_response(Status::ErrBadPayload, &[]);
            s.write_all(&resp).await?;
            return Ok(());
        }
    };
    let Some(key) = key_or_reply(s, Ok(req.key), ctx).await? else {
        return Ok(());
    };

    tracing::debug!("SET {} ({} bytes)", key, req.value.len());
    ctx.commit_write(key, req.value);

    let resp = encode_response(Status::Ok, &[]);
    s.write_all(&resp).await?;
    Ok(())
}

async fn handle_get(s: &mut UnixStream, payload: &[u8], ctx: &Context) -> std::io::Result<()> {
    let Some(key) = key_or_reply(s, decode_key_only(payload), ctx).await? else {
        return Ok(());
    };

    match ctx.records.get(&key) {
        Some(r) => {
            let body = encode_value_payload(&RecordValue {
                value: r.value,
                written_ms: r.written_ms,
            });
            let resp = encode_response(Status::Ok, &body);
            s.write_all(&resp).await?;
        }
        None => {
            let resp = encode_response(Status::NotFound, &[]);
            s.write_all(&resp).await?;
        }
    }
    Ok(())
}

async fn handle_del(s: &mut UnixStream, payload: &[u8], ctx: &Context) -> std::io::Result<()> {
    let Some(key) = key_or_reply(s, decode_key_only(payload), ctx).await? else {
        return Ok(());
    };

    let status = if ctx.commit_delete(key) {
        Status::Ok
    } else {
        Status::NotFound
    };
    let resp = encode_response(status, &[]);
    s.write_all(&resp).await?;
    Ok(())
}

async fn handle_stats(s: &mut UnixStream, ctx: &Context) -> std::io::Result<()> {
    let stats = ctx
        .metrics
        .snapshot(ctx.records.len(), ctx.pubsub.topic_count());

    let payload = encode_stats_v1(&stats);
    let resp = encode_response(Status::Ok, &payload);
    s.write_all(&resp).await?;
    Ok(())
}
