//! Connection flags shared by the MongoDB command-line tools

use serde::{Deserialize, Serialize};

/// Where and how to reach the replica set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MongoConnection {
    pub host: String,
    pub port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authentication_database: Option<String>,
    pub ssl: bool,
}

impl Default for MongoConnection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 27017,
            username: None,
            password: None,
            authentication_database: None,
            ssl: false,
        }
    }
}

impl MongoConnection {
    /// Flags understood by mongodump and the mongo shell alike
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--host".to_string(),
            self.host.clone(),
            "--port".to_string(),
            self.port.to_string(),
        ];

        if let Some(username) = &self.username {
            args.push("--username".to_string());
            args.push(username.clone());
        }
        if let Some(password) = &self.password {
            args.push("--password".to_string());
            args.push(password.clone());
        }
        if let Some(db) = &self.authentication_database {
            args.push("--authenticationDatabase".to_string());
            args.push(db.clone());
        }
        if self.ssl {
            args.push("--ssl".to_string());
        }

        args
    }
}
