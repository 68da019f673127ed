use crate::Error;

/// Incremental UTF-8 decoder for byte streams whose chunk boundaries may
/// fall inside a multi-byte sequence.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    carry: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes one chunk, holding back a trailing incomplete sequence until
    /// the next chunk completes it.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, Error> {
        let mut bytes = std::mem::take(&mut self.carry);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_string()),
            Err(e) if e.error_len().is_none() => {
                let valid_up_to = e.valid_up_to();
                let text = String::from_utf8_lossy(&bytes[..valid_up_to])
                    .into_owned();
                self.carry = bytes[valid_up_to..].to_vec();
                Ok(text)
            }
            Err(e) => Err(Error::StreamDecode(format!(
                "stream is not valid utf-8: {}",
                e
            ))),
        }
    }

    /// Fails if the stream ended in the middle of a multi-byte sequence.
    pub fn finish(self) -> Result<(), Error> {
        if self.carry.is_empty() {
            Ok(())
        } else {
            Err(Error::StreamDecode(
                "stream ended with an incomplete utf-8 sequence".to_string(),
            ))
        }
    }
}
