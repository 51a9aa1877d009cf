use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use url::Url;

#[derive(Debug)]
pub struct Config {
    // http server configuration
    /// address for the API server to listen on.
    ///  if not set then 0.0.0.0:3000 will be used
    pub api_listen_addr: Option<SocketAddr>,

    // data store configuration
    /// a path to a sqlite database, if not set then an
    ///  in-memory database will be used
    pub sqlite_path: Option<PathBuf>,

    // ipfs configuration
    /// url of the Kubo RPC API the daemon talks to
    pub ipfs_api_url: Url,

    // misc
    pub log_level: tracing::Level,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_listen_addr: Some(SocketAddr::new(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)), 3000)),
            sqlite_path: None,
            ipfs_api_url: Url::parse("http://127.0.0.1:5001").expect("static url"),
            log_level: tracing::Level::INFO,
        }
    }
}
