use serde::{Deserialize, Serialize};
use util::identity::{Identity, Role};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

impl Claims {
    pub fn identity(&self) -> Identity {
        Identity::new(self.sub.clone(), self.role)
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);
