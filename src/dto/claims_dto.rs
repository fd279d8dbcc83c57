use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Username the token was issued for.
    pub sub: String,
    /// Database id of the user.
    pub uid: i64,
    pub exp: usize,
}
