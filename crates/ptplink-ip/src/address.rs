use std::fmt;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::str::FromStr;

use ptplink_transport::{Result, TransportError};
use serde::{Deserialize, Serialize};

/// Wire dialect of a PTP/IP connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// PTP/IP as published: typed 8-byte frame headers, init-event handshake.
    Standard,
    /// Fujifilm's variant: 4-byte length headers around generic containers.
    Fuji,
}

impl Dialect {
    pub const fn default_port(self) -> u16 {
        match self {
            Self::Standard => 15740,
            Self::Fuji => 55740,
        }
    }

    /// Event port used when the address names only a command port.
    ///
    /// Standard PTP/IP multiplexes both channels on one port.
    pub const fn default_event_port(self, command_port: u16) -> u16 {
        match self {
            Self::Standard => command_port,
            Self::Fuji => command_port.wrapping_add(1),
        }
    }

    /// Address scheme that selects this dialect.
    pub const fn scheme(self) -> &'static str {
        match self {
            Self::Standard => "ptpip",
            Self::Fuji => "fujiptpip",
        }
    }

    fn from_scheme(scheme: &str) -> Option<Self> {
        match scheme {
            "ptpip" => Some(Self::Standard),
            "fujiptpip" => Some(Self::Fuji),
            _ => None,
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

/// A parsed camera address.
///
/// Accepted forms, with an optional `ptpip:` or `fujiptpip:` prefix:
/// `host`, `host:port`, `host:port:event_port`. The host is an IPv4 literal.
/// Without a prefix the event port is the command port plus one; only an
/// explicit `ptpip:` prefix puts both channels on the same port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpAddress {
    pub dialect: Dialect,
    pub host: Ipv4Addr,
    pub command_port: u16,
    pub event_port: u16,
}

impl IpAddress {
    /// Parse `address`. A scheme prefix overrides `dialect`.
    pub fn parse(address: &str, dialect: Dialect) -> Result<Self> {
        let invalid = |reason: &str| TransportError::InvalidAddress {
            address: address.to_string(),
            reason: reason.to_string(),
        };

        let mut parts: Vec<&str> = address.trim().split(':').collect();
        let dialect = match parts.first().and_then(|p| Dialect::from_scheme(p)) {
            Some(selected) => {
                parts.remove(0);
                selected
            }
            None => dialect,
        };

        let (host, ports) = match parts.split_first() {
            Some((host, ports)) if !host.is_empty() => (*host, ports),
            _ => return Err(invalid("missing host")),
        };
        let host: Ipv4Addr = host
            .parse()
            .map_err(|_| invalid("host must be an IPv4 address"))?;

        let parse_port = |text: &str| {
            text.parse::<u16>()
                .ok()
                .filter(|&port| port != 0)
                .ok_or_else(|| invalid("port must be a number between 1 and 65535"))
        };
        let (command_port, event_port) = match ports {
            [] => {
                let port = dialect.default_port();
                (port, dialect.default_event_port(port))
            }
            [port] => {
                let port = parse_port(port)?;
                (port, dialect.default_event_port(port))
            }
            [port, event] => (parse_port(port)?, parse_port(event)?),
            _ => return Err(invalid("too many ':' separated fields")),
        };

        Ok(Self {
            dialect,
            host,
            command_port,
            event_port,
        })
    }

    pub fn command_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.command_port))
    }

    pub fn event_addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.host, self.event_port))
    }
}

impl FromStr for IpAddress {
    type Err = TransportError;

    /// Parses with the Fuji dialect unless a scheme says otherwise.
    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s, Dialect::Fuji)
    }
}

impl fmt::Display for IpAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.dialect, self.host, self.command_port, self.event_port
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fuji_event_port_follows_command_port() {
        let addr = IpAddress::parse("192.0.2.10:55740", Dialect::Fuji).unwrap();
        assert_eq!(addr.command_addr().to_string(), "192.0.2.10:55740");
        assert_eq!(addr.event_addr().to_string(), "192.0.2.10:55741");
    }

    #[test]
    fn bare_address_puts_events_on_next_port() {
        let addr: IpAddress = "192.0.2.10:55740".parse().unwrap();
        assert_eq!(addr.command_addr().to_string(), "192.0.2.10:55740");
        assert_eq!(addr.event_addr().to_string(), "192.0.2.10:55741");

        let addr: IpAddress = "192.168.1.1".parse().unwrap();
        assert_eq!((addr.command_port, addr.event_port), (55740, 55741));
        let addr: IpAddress = "192.168.1.1:9000".parse().unwrap();
        assert_eq!((addr.command_port, addr.event_port), (9000, 9001));
    }

    #[test]
    fn ptpip_scheme_shares_one_port() {
        let addr: IpAddress = "ptpip:192.168.1.1".parse().unwrap();
        assert_eq!(addr.dialect, Dialect::Standard);
        assert_eq!((addr.command_port, addr.event_port), (15740, 15740));

        let addr: IpAddress = "ptpip:192.168.1.1:9000".parse().unwrap();
        assert_eq!((addr.command_port, addr.event_port), (9000, 9000));
    }

    #[test]
    fn scheme_selects_dialect() {
        let addr = IpAddress::parse("fujiptpip:10.0.0.1", Dialect::Standard).unwrap();
        assert_eq!(addr.dialect, Dialect::Fuji);
        assert_eq!((addr.command_port, addr.event_port), (55740, 55741));

        let addr = IpAddress::parse("ptpip:10.0.0.1:15740:15741", Dialect::Fuji).unwrap();
        assert_eq!(addr.dialect, Dialect::Standard);
        assert_eq!(addr.event_port, 15741);
    }

    #[test]
    fn display_is_parseable() {
        let addr = IpAddress::parse("10.0.0.1:1234", Dialect::Fuji).unwrap();
        let text = addr.to_string();
        assert_eq!(text, "fujiptpip:10.0.0.1:1234:1235");
        assert_eq!(text.parse::<IpAddress>().unwrap(), addr);
    }

    #[test]
    fn rejects_bad_input() {
        for bad in [
            "",
            "ptpip:",
            "camera.local",
            "10.0.0.1:http",
            "10.0.0.1:0",
            "10.0.0.1:70000",
            "10.0.0.1:1:2:3",
            "usb:10.0.0.1",
        ] {
            assert!(
                matches!(
                    IpAddress::parse(bad, Dialect::Standard),
                    Err(TransportError::InvalidAddress { .. })
                ),
                "{bad:?} should be rejected"
            );
        }
    }
}
