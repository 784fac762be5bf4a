use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use url::Url;

#[derive(Debug, Clone)]
pub struct Config {
    // Listen address, port 0 picks an ephemeral port
    pub listen_addr: SocketAddr,
    // Base URL handed to browsers, derived from the bound address if unset
    pub advertised_url: Option<Url>,
    // log level for http tracing
    pub log_level: tracing::Level,
}

impl Config {
    pub fn new(listen_addr: SocketAddr, advertised_url: Option<Url>) -> Self {
        tracing::debug!(
            %listen_addr,
            advertised_url = ?advertised_url.as_ref().map(Url::as_str),
            "creating HTTP server config"
        );
        Self {
            listen_addr,
            advertised_url,
            log_level: tracing::Level::INFO,
        }
    }

    /// Base URL for a server bound to `bound`
    ///
    /// An explicit advertised URL wins. Otherwise it is `http://<addr>/`,
    /// with a wildcard bind address swapped for loopback since browsers
    /// cannot connect to `0.0.0.0`.
    pub fn base_url(&self, bound: SocketAddr) -> Result<Url, ConfigError> {
        if let Some(url) = &self.advertised_url {
            return Ok(with_trailing_slash(url.clone()));
        }

        let ip = match bound.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            ip => ip,
        };
        Ok(Url::parse(&format!(
            "http://{}/",
            SocketAddr::new(ip, bound.port())
        ))?)
    }
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_bound_addr() {
        let config = Config::new("127.0.0.1:0".parse().unwrap(), None);
        let url = config.base_url("127.0.0.1:4321".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:4321/");
    }

    #[test]
    fn test_base_url_wildcard_becomes_loopback() {
        let config = Config::new("0.0.0.0:777".parse().unwrap(), None);
        let url = config.base_url("0.0.0.0:777".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:777/");
    }

    #[test]
    fn test_advertised_url_wins() {
        let advertised = Url::parse("https://extensions.corp.example/depot").unwrap();
        let config = Config::new("127.0.0.1:777".parse().unwrap(), Some(advertised));
        let url = config.base_url("127.0.0.1:777".parse().unwrap()).unwrap();
        assert_eq!(url.as_str(), "https://extensions.corp.example/depot/");
    }
}
