use serde::Deserialize;

/// Configuration options of the HR service.
///
/// Loaded from `config/default.yaml`, an optional `config/local.yaml` and
/// `APP_*` environment variables, in that order.
#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    /// Interface the HTTP server binds to.
    pub address: String,
    pub port: u16,
    /// Path of the SQLite database file.
    pub database_url: String,
    /// Secret shared with the auth service; verifies JWTs and signs cookies.
    pub secret: String,
    /// Buffered refresh events per hub before slow subscribers start lagging.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

fn default_broadcast_capacity() -> usize {
    16
}

#[cfg(feature = "server")]
impl ServerConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("APP"))
            .build()
            .and_then(|c| c.try_deserialize::<ServerConfig>())
    }
}
