#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub expires_at: u64,
}
