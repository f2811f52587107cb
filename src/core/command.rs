//! Command parser for the : command system

use crate::domain::NetworkConfig;

/// Parsed command from user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // Session
    Connect(String),
    Disconnect,
    Network(Option<String>),
    AddNetwork(Option<String>),

    // Views
    Wallet,
    Networks,
    Help,

    // Actions
    Refresh,
    Copy,
    Explorer,
    Export,
    Quit,

    // Unknown command
    Unknown(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let mut parts = input.splitn(2, ' ');
    let cmd = parts.next().unwrap_or("");
    let args = parts
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    match cmd.to_lowercase().as_str() {
        "connect" | "conn" => {
            if let Some(addr) = args {
                Command::Connect(addr)
            } else {
                Command::Unknown(input.to_string())
            }
        }
        "disconnect" | "dc" => Command::Disconnect,
        "network" | "net" => Command::Network(args),
        "add-network" | "addnet" => Command::AddNetwork(args),

        "wallet" | "home" => Command::Wallet,
        "networks" | "nets" => Command::Networks,
        "help" | "?" => Command::Help,

        "refresh" | "r" => Command::Refresh,
        "copy" | "yank" => Command::Copy,
        "explorer" | "open" => Command::Explorer,
        "export" => Command::Export,
        "quit" | "q" => Command::Quit,

        _ => Command::Unknown(input.to_string()),
    }
}

/// Parse `add-network` arguments: `<id> <rpc-url> [explorer=<url>] [symbol=<sym>] <name...>`
pub fn parse_add_network(args: &str) -> Result<NetworkConfig, String> {
    let mut tokens = args.split_whitespace();

    let id_str = tokens.next().ok_or("missing chain id")?;
    let id: u64 = id_str
        .parse()
        .map_err(|_| format!("invalid chain id: {}", id_str))?;
    let rpc_url = tokens.next().ok_or("missing rpc url")?;

    let mut explorer = String::new();
    let mut symbol = None;
    let mut name_parts = Vec::new();
    for token in tokens {
        if let Some(value) = token.strip_prefix("explorer=") {
            explorer = value.to_string();
        } else if let Some(value) = token.strip_prefix("symbol=") {
            symbol = Some(value.to_string());
        } else {
            name_parts.push(token);
        }
    }

    let name = if name_parts.is_empty() {
        format!("Chain {}", id)
    } else {
        name_parts.join(" ")
    };

    let config = NetworkConfig::new(id, name, rpc_url, explorer);
    Ok(match symbol {
        Some(symbol) => config.with_symbol(symbol),
        None => config,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_session_commands() {
        assert_eq!(
            parse_command("connect 0x1234"),
            Command::Connect("0x1234".to_string())
        );
        assert_eq!(
            parse_command("conn   0xabc  "),
            Command::Connect("0xabc".to_string())
        );
        assert_eq!(parse_command("connect"), Command::Unknown("connect".to_string()));
        assert_eq!(parse_command("dc"), Command::Disconnect);
        assert_eq!(
            parse_command("net 137"),
            Command::Network(Some("137".to_string()))
        );
        assert_eq!(parse_command("network"), Command::Network(None));
        assert_eq!(
            parse_command("addnet 1337 http://localhost:8545 Local"),
            Command::AddNetwork(Some("1337 http://localhost:8545 Local".to_string()))
        );
    }

    #[test]
    fn test_parse_view_and_action_commands() {
        assert_eq!(parse_command("NETWORKS"), Command::Networks);
        assert_eq!(parse_command("home"), Command::Wallet);
        assert_eq!(parse_command("r"), Command::Refresh);
        assert_eq!(parse_command("yank"), Command::Copy);
        assert_eq!(parse_command("open"), Command::Explorer);
        assert_eq!(parse_command("export"), Command::Export);
        assert_eq!(parse_command("q"), Command::Quit);
        assert_eq!(parse_command("?"), Command::Help);
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("notacommand"),
            Command::Unknown("notacommand".to_string())
        );
    }

    #[test]
    fn test_parse_add_network() {
        let config = parse_add_network("1337 http://localhost:8545 Local Devnet").unwrap();
        assert_eq!(config.id, 1337);
        assert_eq!(config.name, "Local Devnet");
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert_eq!(config.explorer_url, "");
        assert_eq!(config.currency_symbol, "ETH");

        let config = parse_add_network(
            "100 https://rpc.gnosischain.com explorer=https://gnosisscan.io symbol=xDAI Gnosis",
        )
        .unwrap();
        assert_eq!(config.explorer_url, "https://gnosisscan.io");
        assert_eq!(config.currency_symbol, "xDAI");
        assert_eq!(config.name, "Gnosis");

        let config = parse_add_network("42 http://x").unwrap();
        assert_eq!(config.name, "Chain 42");
    }

    #[test]
    fn test_parse_add_network_errors() {
        assert!(parse_add_network("").is_err());
        assert!(parse_add_network("abc http://x").is_err());
        assert!(parse_add_network("1337").is_err());
    }
}
