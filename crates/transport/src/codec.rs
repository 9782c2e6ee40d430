//! Length-prefixed bincode framing.
//!
//! A frame is a 4-byte big-endian payload length followed by the bincode
//! payload. Each connection carries one request frame and one response frame.

use bytes::{BufMut, Bytes, BytesMut};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Result, WireError};

const LEN_PREFIX: usize = 4;

/// Serialize `message` into a complete frame.
pub fn encode_frame<T: Serialize>(message: &T, max_len: usize) -> Result<Bytes> {
    let payload = bincode::serialize(message)?;
    if payload.len() > max_len || payload.len() > u32::MAX as usize {
        return Err(WireError::FrameTooLarge {
            len: payload.len(),
            max: max_len,
        });
    }
    let mut frame = BytesMut::with_capacity(LEN_PREFIX + payload.len());
    frame.put_u32(payload.len() as u32);
    frame.put_slice(&payload);
    Ok(frame.freeze())
}

pub async fn write_frame<W, T>(writer: &mut W, message: &T, max_len: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let frame = encode_frame(message, max_len)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one frame; rejects a declared length above `max_len` before reading
/// the payload.
pub async fn read_frame<R, T>(reader: &mut R, max_len: usize) -> Result<T>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await? as usize;
    if len > max_len {
        return Err(WireError::FrameTooLarge { len, max: max_len });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}
