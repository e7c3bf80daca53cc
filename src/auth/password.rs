use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Password hashing task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// One-way password hashing with a configurable work factor.
///
/// bcrypt is self-salting, so equal plaintexts never produce equal digests,
/// and each digest embeds its own cost parameter: verification works for
/// digests stored under an older work factor. The adaptive hash takes tens of
/// milliseconds by design, so both operations run on the blocking pool rather
/// than stalling the request-handling task.
#[derive(Clone)]
pub struct PasswordService {
    cost: u32,
}

impl PasswordService {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub async fn hash(&self, plaintext: &str) -> Result<String, PasswordError> {
        let plaintext = plaintext.to_string();
        let cost = self.cost;
        let digest = tokio::task::spawn_blocking(move || bcrypt::hash(plaintext, cost)).await??;
        Ok(digest)
    }

    pub async fn verify(&self, plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
        let plaintext = plaintext.to_string();
        let digest = digest.to_string();
        // bcrypt::verify compares the recomputed digest without early exit.
        let ok = tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &digest)).await??;
        Ok(ok)
    }
}
