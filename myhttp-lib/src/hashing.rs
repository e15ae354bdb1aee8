//! Streaming digest accumulators.
//!
//! Workers never see a concrete hash type. They ask the configured
//! [`HashAlgorithm`] for a boxed [`DigestAccumulator`], feed it body chunks
//! as they arrive, and finalize it once.

use crate::error::FetchHashError;
use crate::transport::BodyStream;
use crate::types::HashAlgorithm;
use digest::Digest;
use futures::StreamExt;

/// Incremental hash over a byte stream, finalized once to lowercase hex.
pub trait DigestAccumulator: Send {
    /// Feed the next chunk of bytes.
    fn update(&mut self, bytes: &[u8]);

    /// Consume the accumulator and render the digest as lowercase hex.
    fn finalize_hex(self: Box<Self>) -> String;

    /// Algorithm this accumulator computes.
    fn algorithm(&self) -> HashAlgorithm;
}

/// Adapter from any RustCrypto [`Digest`] to [`DigestAccumulator`].
pub struct DigestHasher<D> {
    inner: D,
    algorithm: HashAlgorithm,
}

impl<D: Digest> DigestHasher<D> {
    /// Start an empty digest tagged with `algorithm`.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            inner: D::new(),
            algorithm,
        }
    }
}

impl<D: Digest + Send> DigestAccumulator for DigestHasher<D> {
    fn update(&mut self, bytes: &[u8]) {
        Digest::update(&mut self.inner, bytes);
    }

    fn finalize_hex(self: Box<Self>) -> String {
        hex::encode(self.inner.finalize())
    }

    fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }
}

impl HashAlgorithm {
    /// Create a fresh accumulator for this algorithm.
    pub fn accumulator(&self) -> Box<dyn DigestAccumulator> {
        match self {
            HashAlgorithm::Md5 => Box::new(DigestHasher::<md5::Md5>::new(*self)),
            HashAlgorithm::Sha256 => Box::new(DigestHasher::<sha2::Sha256>::new(*self)),
            HashAlgorithm::Sha512 => Box::new(DigestHasher::<sha2::Sha512>::new(*self)),
        }
    }
}

/// Hash an in-memory buffer in one shot.
pub fn digest_bytes(algorithm: HashAlgorithm, bytes: &[u8]) -> String {
    let mut accumulator = algorithm.accumulator();
    accumulator.update(bytes);
    accumulator.finalize_hex()
}

/// Drain a body stream into an accumulator chunk by chunk.
///
/// The stream is dropped before returning, whether the read completed or
/// failed, which releases the underlying connection.
pub async fn hash_stream(
    mut body: BodyStream,
    mut accumulator: Box<dyn DigestAccumulator>,
) -> Result<String, FetchHashError> {
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        accumulator.update(&chunk);
    }
    drop(body);
    Ok(accumulator.finalize_hex())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use futures::stream;

    #[test]
    fn test_md5_known_values() {
        assert_eq!(
            digest_bytes(HashAlgorithm::Md5, b"my request"),
            "0a44cf32bcd5f63fc5e047e25f991f97"
        );
        assert_eq!(
            digest_bytes(HashAlgorithm::Md5, b""),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }

    #[test]
    fn test_sha_known_values() {
        assert_eq!(
            digest_bytes(HashAlgorithm::Sha256, b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        let sha512 = digest_bytes(HashAlgorithm::Sha512, b"abc");
        assert!(sha512.starts_with("ddaf35a193617abacc417349ae204131"));
    }

    #[test]
    fn test_hex_length_matches_algorithm() {
        for algorithm in HashAlgorithm::all() {
            let hex = digest_bytes(*algorithm, b"hello world");
            assert_eq!(hex.len(), algorithm.digest_len() * 2);
            assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        }
    }

    #[test]
    fn test_incremental_updates_match_one_shot() {
        let mut accumulator = HashAlgorithm::Md5.accumulator();
        for piece in ["chunked ", "body over ", "several ", "pieces"] {
            accumulator.update(piece.as_bytes());
        }
        assert_eq!(accumulator.algorithm(), HashAlgorithm::Md5);
        assert_eq!(
            accumulator.finalize_hex(),
            "3b1709d2a3189b5fca5255dc000fa6d8"
        );
    }

    #[test]
    fn test_hash_stream_chunks() {
        let chunks: Vec<Result<Bytes, FetchHashError>> = vec![
            Ok(Bytes::from_static(b"my ")),
            Ok(Bytes::from_static(b"request")),
        ];
        let body: BodyStream = Box::pin(stream::iter(chunks));
        let hex = tokio_test::block_on(hash_stream(body, HashAlgorithm::Md5.accumulator()));
        assert_eq!(hex.unwrap(), "0a44cf32bcd5f63fc5e047e25f991f97");
    }

    #[test]
    fn test_hash_stream_propagates_read_error() {
        let chunks: Vec<Result<Bytes, FetchHashError>> = vec![
            Ok(Bytes::from_static(b"partial")),
            Err(FetchHashError::stream("http://a.test", "connection reset")),
        ];
        let body: BodyStream = Box::pin(stream::iter(chunks));
        let result = tokio_test::block_on(hash_stream(body, HashAlgorithm::Md5.accumulator()));
        assert!(matches!(result, Err(FetchHashError::StreamError { .. })));
    }
}
