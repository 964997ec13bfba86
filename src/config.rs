//! Command line configuration
//!
//! The listening address is the only thing the server can be configured with.

use clap::Parser;

/// Port the server listens on when none is given
pub const DEFAULT_PORT: u16 = 6677;

#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "line_chat")]
#[command(about = "Line-oriented multi-user TCP chat server", long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port number to bind to
    #[arg(short = 'p', long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl Config {
    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["line_chat"]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:6677");
    }

    #[test]
    fn test_overrides() {
        let config = Config::try_parse_from(["line_chat", "-H", "127.0.0.1", "--port", "7000"]).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 7000);
    }

    #[test]
    fn test_invalid_port_rejected() {
        assert!(Config::try_parse_from(["line_chat", "--port", "70000"]).is_err());
    }
}
