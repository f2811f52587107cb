use std::time::{Duration, Instant};

use chrono::{DateTime, Local};

use crate::core::{parse_add_network, parse_command, Action, Command, NavigateTarget, NotifyLevel};
use crate::domain::{Amount, FetchError, FetchTicket, NetworkConfig, SessionController};
use crate::export::{ReportValue, SessionReport};

/// Main tabs in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Wallet,
    Networks,
}

impl Tab {
    pub const ALL: [Tab; 2] = [Tab::Wallet, Tab::Networks];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Wallet => "Wallet",
            Tab::Networks => "Networks",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            Tab::Wallet => '1',
            Tab::Networks => '2',
        }
    }

    pub fn next(&self) -> Tab {
        match self {
            Tab::Wallet => Tab::Networks,
            Tab::Networks => Tab::Wallet,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

#[derive(Debug, Clone, Default)]
pub struct CommandBar {
    pub input: String,
    /// Last command that was run, recalled with Up
    pub last: Option<String>,
}

/// One chain reading as the UI sees it.
///
/// A failed fetch is `Unavailable`, which the UI must never render as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reading<T> {
    Idle,
    Loading,
    Ready(T),
    Unavailable(String),
}

impl<T> From<Result<T, FetchError>> for Reading<T> {
    fn from(result: Result<T, FetchError>) -> Self {
        match result {
            Ok(value) => Reading::Ready(value),
            Err(err) => Reading::Unavailable(err.to_string()),
        }
    }
}

impl<T: Clone> Reading<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, Reading::Loading)
    }

    pub fn to_report(&self) -> ReportValue<T> {
        match self {
            Reading::Idle | Reading::Loading => ReportValue::NotFetched,
            Reading::Ready(value) => ReportValue::Ok {
                value: value.clone(),
            },
            Reading::Unavailable(reason) => ReportValue::Unavailable {
                error: reason.clone(),
            },
        }
    }
}

pub struct App {
    pub controller: SessionController,
    pub current_tab: Tab,
    pub input_mode: InputMode,
    pub command: CommandBar,
    pub status: Option<StatusMessage>,
    /// Cursor in the Networks list (registry order)
    pub selected_network: usize,
    pub balance: Reading<Amount>,
    pub gas_price: Reading<Amount>,
    pub block_height: Reading<u64>,
    pub last_refreshed: Option<DateTime<Local>>,
    pub help_open: bool,
    pub should_quit: bool,
    pending_fetch: Option<FetchTicket>,
    pending_copy: Option<String>,
    pending_export: bool,
}

impl App {
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller,
            current_tab: Tab::Wallet,
            input_mode: InputMode::Normal,
            command: CommandBar::default(),
            status: None,
            selected_network: 0,
            balance: Reading::Idle,
            gas_price: Reading::Idle,
            block_height: Reading::Idle,
            last_refreshed: None,
            help_open: false,
            should_quit: false,
            pending_fetch: None,
            pending_copy: None,
            pending_export: false,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > Duration::from_secs(4) {
                self.status = None;
            }
        }
    }

    pub fn active_network(&self) -> Option<&NetworkConfig> {
        self.controller.active_network()
    }

    pub fn selected_network(&self) -> Option<&NetworkConfig> {
        self.controller.registry().iter().nth(self.selected_network)
    }

    pub fn is_fetching(&self) -> bool {
        self.balance.is_loading() || self.gas_price.is_loading() || self.block_height.is_loading()
    }

    // ---- command bar ----

    pub fn enter_command(&mut self) {
        self.enter_command_with("");
    }

    /// Open the command bar with `prefix` already typed
    pub fn enter_command_with(&mut self, prefix: &str) {
        self.input_mode = InputMode::Command;
        self.command.input = prefix.to_string();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn recall_last_command(&mut self) {
        if let Some(last) = self.command.last.clone() {
            self.command.input = last;
        }
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        self.exit_command();
        if input.is_empty() {
            return;
        }
        self.command.last = Some(input.clone());

        let cmd = parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
    }

    // ---- session operations ----

    pub fn connect(&mut self, raw_address: &str) -> Action {
        match self.controller.connect(raw_address) {
            Ok(state) => {
                self.on_session_changed();
                let network = self
                    .active_network()
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                let address = state
                    .address()
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                Action::Notify(
                    format!("Connected {} on {}", address, network),
                    NotifyLevel::Info,
                )
            }
            Err(err) => Action::Notify(err.to_string(), NotifyLevel::Error),
        }
    }

    /// Startup connect from CLI/config. The network is only selected once
    /// the address was accepted, so a rejected address stays on screen.
    pub fn start_session(&mut self, raw_address: &str, network_id: Option<u64>) {
        let action = self.connect(raw_address);
        self.apply_action(action);
        if !self.controller.state().is_connected() {
            return;
        }
        if let Some(id) = network_id {
            let action = self.switch_network(id);
            self.apply_action(action);
        }
    }

    pub fn disconnect(&mut self) -> Action {
        let was_connected = self.controller.state().is_connected();
        self.controller.disconnect();
        self.clear_readings();
        if was_connected {
            Action::Notify("Disconnected".to_string(), NotifyLevel::Info)
        } else {
            Action::Notify("Already disconnected".to_string(), NotifyLevel::Info)
        }
    }

    pub fn switch_network(&mut self, network_id: u64) -> Action {
        match self.controller.switch_network(network_id) {
            Ok(_) => {
                self.on_session_changed();
                let name = self
                    .active_network()
                    .map(|n| n.name.clone())
                    .unwrap_or_default();
                Action::Notify(format!("Switched to {}", name), NotifyLevel::Info)
            }
            Err(err) => Action::Notify(err.to_string(), NotifyLevel::Error),
        }
    }

    pub fn add_network(&mut self, config: NetworkConfig) -> Action {
        let label = format!("{} ({})", config.name, config.id);
        match self.controller.add_custom_network(config) {
            Ok(()) => Action::Notify(format!("Added network {}", label), NotifyLevel::Info),
            Err(err) => Action::Notify(err.to_string(), NotifyLevel::Error),
        }
    }

    /// Switch to the network under the cursor in the Networks tab
    pub fn activate_selected_network(&mut self) {
        let Some(id) = self.selected_network().map(|n| n.id) else {
            return;
        };
        let action = self.switch_network(id);
        self.apply_action(action);
    }

    /// Queue a fetch of balance, gas price and block height for the
    /// current session
    pub fn request_refresh(&mut self) {
        match self.controller.ticket() {
            Ok(ticket) => {
                self.balance = Reading::Loading;
                self.gas_price = Reading::Loading;
                self.block_height = Reading::Loading;
                self.pending_fetch = Some(ticket);
            }
            Err(err) => self.set_status(err.to_string(), StatusLevel::Warn),
        }
    }

    fn on_session_changed(&mut self) {
        if let Some(pos) = self
            .controller
            .state()
            .active_network_id()
            .and_then(|id| self.controller.registry().position(id))
        {
            self.selected_network = pos;
        }
        self.clear_readings();
        self.request_refresh();
    }

    fn clear_readings(&mut self) {
        self.balance = Reading::Idle;
        self.gas_price = Reading::Idle;
        self.block_height = Reading::Idle;
        self.last_refreshed = None;
        self.pending_fetch = None;
    }

    // ---- fetch results ----

    /// Results fetched under an older epoch describe a previous session
    fn accept(&self, epoch: u64, what: &str) -> bool {
        if self.controller.is_current(epoch) {
            true
        } else {
            tracing::debug!(epoch, current = self.controller.epoch(), what, "dropped stale result");
            false
        }
    }

    pub fn apply_balance(&mut self, epoch: u64, result: Result<Amount, FetchError>) {
        if !self.accept(epoch, "balance") {
            return;
        }
        if let Err(err) = &result {
            self.set_status(format!("Balance unavailable: {}", err), StatusLevel::Error);
        } else {
            self.last_refreshed = Some(Local::now());
        }
        self.balance = result.into();
    }

    pub fn apply_gas_price(&mut self, epoch: u64, result: Result<Amount, FetchError>) {
        if !self.accept(epoch, "gas_price") {
            return;
        }
        if result.is_ok() {
            self.last_refreshed = Some(Local::now());
        }
        self.gas_price = result.into();
    }

    pub fn apply_block_height(&mut self, epoch: u64, result: Result<u64, FetchError>) {
        if !self.accept(epoch, "block_height") {
            return;
        }
        if result.is_ok() {
            self.last_refreshed = Some(Local::now());
        }
        self.block_height = result.into();
    }

    pub fn apply_runtime_error(&mut self, message: String) {
        tracing::error!(%message, "runtime error");
        self.set_status(message, StatusLevel::Error);
    }

    // ---- navigation ----

    pub fn set_tab(&mut self, tab: Tab) {
        self.current_tab = tab;
    }

    pub fn cycle_tab(&mut self) {
        self.current_tab = self.current_tab.next();
    }

    pub fn move_selection_up(&mut self) {
        self.selected_network = self.selected_network.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let len = self.controller.registry().len();
        if len > 0 && self.selected_network + 1 < len {
            self.selected_network += 1;
        }
    }

    // ---- requests picked up by the event loop ----

    pub fn take_fetch_request(&mut self) -> Option<FetchTicket> {
        self.pending_fetch.take()
    }

    pub fn take_copy_request(&mut self) -> Option<String> {
        self.pending_copy.take()
    }

    pub fn take_export_request(&mut self) -> bool {
        std::mem::take(&mut self.pending_export)
    }

    /// Snapshot of the session and its latest readings
    pub fn report(&self) -> SessionReport {
        SessionReport {
            generated_at: Local::now(),
            session: self.controller.state().clone(),
            network: self.active_network().cloned(),
            balance: self.balance.to_report(),
            gas_price: self.gas_price.to_report(),
            block_height: self.block_height.to_report(),
        }
    }
}

impl App {
    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Connect(raw) => self.connect(raw),
            Command::Disconnect => self.disconnect(),
            Command::Network(None) => Action::Navigate(NavigateTarget::Networks),
            Command::Network(Some(arg)) => match self.resolve_network(arg) {
                Some(id) => self.switch_network(id),
                None => Action::Notify(format!("Unknown network: {}", arg), NotifyLevel::Error),
            },
            Command::AddNetwork(None) => Action::Notify(
                "Usage: add-network <id> <rpc-url> [explorer=<url>] [symbol=<sym>] <name>"
                    .to_string(),
                NotifyLevel::Warn,
            ),
            Command::AddNetwork(Some(args)) => match parse_add_network(args) {
                Ok(config) => self.add_network(config),
                Err(err) => Action::Notify(err, NotifyLevel::Error),
            },

            Command::Wallet => Action::Navigate(NavigateTarget::Wallet),
            Command::Networks => Action::Navigate(NavigateTarget::Networks),
            Command::Help => Action::Help,

            Command::Refresh => Action::Refresh,
            Command::Copy => match self.controller.state().address() {
                Some(address) => Action::Copy(address.to_string()),
                None => Action::Notify("Not connected".to_string(), NotifyLevel::Warn),
            },
            Command::Explorer => self.explorer_link(),
            Command::Export => Action::Export,
            Command::Quit => Action::Quit,

            Command::Unknown(s) => {
                Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn)
            }
        }
    }

    /// Apply an action returned by a command
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Navigate(target) => match target {
                NavigateTarget::Wallet => self.set_tab(Tab::Wallet),
                NavigateTarget::Networks => self.set_tab(Tab::Networks),
            },
            Action::Copy(text) => self.pending_copy = Some(text),
            Action::Notify(msg, level) => self.set_status(msg, level.into()),
            Action::Refresh => self.request_refresh(),
            Action::Export => self.pending_export = true,
            Action::Help => self.help_open = !self.help_open,
            Action::Quit => self.should_quit = true,
        }
    }

    /// Accept a chain id or a (case-insensitive) network name
    fn resolve_network(&self, arg: &str) -> Option<u64> {
        let registry = self.controller.registry();
        if let Ok(id) = arg.trim().parse::<u64>() {
            // Unknown ids still go through the controller so the
            // rejection is reported the usual way.
            return Some(id);
        }
        registry
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(arg.trim()))
            .map(|n| n.id)
    }

    fn explorer_link(&self) -> Action {
        let Some(address) = self.controller.state().address() else {
            return Action::Notify("Not connected".to_string(), NotifyLevel::Warn);
        };
        match self
            .active_network()
            .and_then(|network| network.explorer_address_url(address))
        {
            Some(url) => Action::Copy(url),
            None => Action::Notify(
                "No block explorer configured for this network".to_string(),
                NotifyLevel::Warn,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChainClient, ChecksumAddress};
    use alloy_primitives::U256;
    use std::sync::Arc;

    struct FixedClient;

    #[async_trait::async_trait]
    impl ChainClient for FixedClient {
        async fn get_balance(
            &self,
            _address: &ChecksumAddress,
            _rpc_url: &str,
        ) -> Result<U256, FetchError> {
            Ok(U256::from(1_500_000_000_000_000_000u128))
        }

        async fn get_gas_price(&self, _rpc_url: &str) -> Result<u128, FetchError> {
            Ok(25_300_000_000)
        }

        async fn get_block_number(&self, _rpc_url: &str) -> Result<u64, FetchError> {
            Ok(19_000_000)
        }
    }

    const ADDR: &str = "0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6";
    const CANONICAL: &str = "0x742d35Cc6634C0532925A3B8D4C9dB96C4B4d8B6";

    fn app() -> App {
        App::new(SessionController::new(Arc::new(FixedClient)))
    }

    fn run(app: &mut App, input: &str) {
        app.command.input = input.to_string();
        app.apply_command();
    }

    #[test]
    fn test_connect_queues_fetch() {
        let mut app = app();
        run(&mut app, "connect 0x742d35cc6634c0532925a3b8d4c9db96c4b4d8b6");

        let ticket = app.take_fetch_request().expect("fetch queued");
        assert_eq!(ticket.address.as_str(), CANONICAL);
        assert_eq!(ticket.network.id, 1);
        assert!(app.balance.is_loading());
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Info);
        assert!(app.take_fetch_request().is_none());
    }

    #[test]
    fn test_connect_rejects_bad_address() {
        let mut app = app();
        run(&mut app, "connect 0x1234");
        assert!(!app.controller.state().is_connected());
        assert!(app.take_fetch_request().is_none());
        let (text, level) = app.status_text().unwrap();
        assert_eq!(level, StatusLevel::Error);
        assert!(text.contains("malformed address"));
    }

    #[test]
    fn test_fetch_failure_is_not_zero() {
        let mut app = app();
        app.connect(ADDR);
        let ticket = app.take_fetch_request().unwrap();

        app.apply_balance(
            ticket.epoch,
            Err(FetchError::Unreachable("connection refused".into())),
        );
        assert!(matches!(app.balance, Reading::Unavailable(_)));
        assert!(app.last_refreshed.is_none());

        app.apply_gas_price(ticket.epoch, Ok(Amount::gwei(25_300_000_000)));
        assert_eq!(
            app.gas_price,
            Reading::Ready(Amount::gwei(25_300_000_000))
        );
        assert!(app.last_refreshed.is_some());

        let report = app.report();
        assert!(matches!(report.balance, ReportValue::Unavailable { .. }));
        assert!(matches!(report.gas_price, ReportValue::Ok { .. }));
        assert_eq!(report.block_height, ReportValue::NotFetched);
    }

    #[test]
    fn test_stale_results_dropped() {
        let mut app = app();
        app.connect(ADDR);
        let old = app.take_fetch_request().unwrap();

        run(&mut app, "net 137");
        let fresh = app.take_fetch_request().unwrap();
        assert_eq!(fresh.network.id, 137);
        assert_ne!(old.epoch, fresh.epoch);

        app.apply_balance(old.epoch, Ok(Amount::native(U256::from(7u64), "ETH")));
        assert!(app.balance.is_loading());

        app.apply_balance(fresh.epoch, Ok(Amount::native(U256::from(7u64), "MATIC")));
        assert!(matches!(app.balance, Reading::Ready(ref a) if a.symbol == "MATIC"));

        app.disconnect();
        app.apply_block_height(fresh.epoch, Ok(1));
        assert_eq!(app.block_height, Reading::Idle);
    }

    #[test]
    fn test_network_by_name_and_unknown() {
        let mut app = app();
        app.connect(ADDR);
        run(&mut app, "network polygon");
        assert_eq!(app.controller.state().active_network_id(), Some(137));
        assert_eq!(app.selected_network().unwrap().id, 137);

        run(&mut app, "network 999");
        assert_eq!(app.controller.state().active_network_id(), Some(137));
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Error);

        run(&mut app, "network nowhere");
        assert!(app.status_text().unwrap().0.contains("Unknown network"));
    }

    #[test]
    fn test_add_network_then_duplicate() {
        let mut app = app();
        run(&mut app, "add-network 1337 http://localhost:8545 Local Devnet");
        assert_eq!(app.controller.registry().len(), 6);
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Info);

        run(&mut app, "addnet 1337 http://localhost:9545 Other");
        assert_eq!(app.controller.registry().len(), 6);
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Error);
        assert_eq!(
            app.controller.registry().get(1337).unwrap().rpc_url,
            "http://localhost:8545"
        );
    }

    #[test]
    fn test_refresh_while_disconnected() {
        let mut app = app();
        run(&mut app, "refresh");
        assert!(app.take_fetch_request().is_none());
        assert_eq!(app.balance, Reading::Idle);
        assert_eq!(app.status_text().unwrap().1, StatusLevel::Warn);
    }

    #[test]
    fn test_copy_and_explorer() {
        let mut app = app();
        run(&mut app, "copy");
        assert!(app.take_copy_request().is_none());

        app.connect(ADDR);
        run(&mut app, "yank");
        assert_eq!(app.take_copy_request().as_deref(), Some(CANONICAL));

        run(&mut app, "explorer");
        assert_eq!(
            app.take_copy_request().unwrap(),
            format!("https://etherscan.io/address/{}", CANONICAL)
        );
    }

    #[test]
    fn test_navigation_and_misc_actions() {
        let mut app = app();
        run(&mut app, "networks");
        assert_eq!(app.current_tab, Tab::Networks);
        app.move_selection_down();
        app.move_selection_down();
        assert_eq!(app.selected_network().unwrap().id, 137);
        for _ in 0..10 {
            app.move_selection_down();
        }
        assert_eq!(app.selected_network, app.controller.registry().len() - 1);

        run(&mut app, "wallet");
        assert_eq!(app.current_tab, Tab::Wallet);

        run(&mut app, "export");
        assert!(app.take_export_request());
        assert!(!app.take_export_request());

        run(&mut app, "help");
        assert!(app.help_open);

        run(&mut app, "bogus");
        assert!(app.status_text().unwrap().0.contains("Unknown command"));

        run(&mut app, "q");
        assert!(app.should_quit);
        assert_eq!(app.command.last.as_deref(), Some("q"));
    }

    #[test]
    fn test_start_session() {
        let mut app = app();
        assert_eq!(app.balance, Reading::Idle);
        assert_eq!(app.block_height, Reading::Idle);

        app.start_session("0x1234", Some(137));
        assert!(!app.controller.state().is_connected());
        let (text, level) = app.status_text().unwrap();
        assert_eq!(level, StatusLevel::Error);
        assert!(text.contains("malformed address"));

        app.start_session(ADDR, Some(137));
        assert_eq!(app.controller.state().active_network_id(), Some(137));
        assert_eq!(app.take_fetch_request().unwrap().network.id, 137);
        assert!(app.status_text().unwrap().0.contains("Polygon"));

        let mut app = self::app();
        app.start_session(ADDR, Some(999));
        assert_eq!(app.controller.state().active_network_id(), Some(1));
        assert!(app.status_text().unwrap().0.contains("unknown network"));
    }

    #[test]
    fn test_activate_selected_network() {
        let mut app = app();
        app.connect(ADDR);
        app.take_fetch_request();
        app.set_tab(Tab::Networks);
        app.selected_network = app.controller.registry().position(11155111).unwrap();
        app.activate_selected_network();
        assert_eq!(app.controller.state().active_network_id(), Some(11155111));
        assert_eq!(app.take_fetch_request().unwrap().network.id, 11155111);
    }
}
