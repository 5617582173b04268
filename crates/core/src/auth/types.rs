use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::IpAddr;

/// Request information for authentication
#[derive(Debug, Clone)]
pub struct AuthRequest {
    /// Header names lowercased
    pub headers: HashMap<String, String>,
    pub source_ip: IpAddr,
}

/// Authenticated caller identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub caller: String,
    pub method: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            caller: "anonymous".to_string(),
            method: "none".to_string(),
        }
    }
}
