use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use walletscope::app::{App, InputMode, StatusLevel, Tab};
use walletscope::config::{self, Config};
use walletscope::core::Command;
use walletscope::domain::SessionController;
use walletscope::export::{self, SessionReport};
use walletscope::infrastructure::{AlloyChainClient, RuntimeBridge, RuntimeCommand, RuntimeEvent};
use walletscope::ui;

#[derive(Debug, Parser)]
#[command(
    name = "walletscope",
    version,
    about = "WalletScope: a terminal wallet session viewer for EVM networks"
)]
struct Args {
    /// Wallet address to connect at startup
    #[arg(long)]
    address: Option<String>,

    /// Chain id to switch to after connecting
    #[arg(long)]
    network: Option<u64>,

    /// Config file (defaults to $WALLETSCOPE_CONFIG or ~/.config/walletscope/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print a JSON session report to stdout and exit
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let config = match args.config.as_deref() {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };
    init_logging(&config, args.json)?;

    let (controller, warnings) = build_controller(&config);
    let address = args.address.or_else(|| config.address.clone());
    let network = args.network.or(config.network);

    if args.json {
        return run_headless(controller, address, network);
    }
    run_tui(controller, address, network, warnings)
}

/// Log to stderr in `--json` mode, otherwise to a file so the alternate
/// screen stays clean. `RUST_LOG` wins over the configured level.
fn init_logging(config: &Config, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if to_stderr {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return Ok(());
    }

    let Some(path) = config::log_path() else {
        return Ok(());
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Controller over the built-in networks plus the configured ones.
/// Rejected config entries are returned as warnings, not errors.
fn build_controller(config: &Config) -> (SessionController, Vec<String>) {
    let client = Arc::new(AlloyChainClient::new(config.rpc_timeout()));
    let mut controller = SessionController::new(client);

    let mut warnings = Vec::new();
    for network in &config.networks {
        if let Err(err) = controller.add_custom_network(network.clone()) {
            warnings.push(format!("Skipped network {}: {}", network.name, err));
        }
    }
    (controller, warnings)
}

fn run_headless(
    mut controller: SessionController,
    address: Option<String>,
    network: Option<u64>,
) -> Result<()> {
    let address = address.context("--json needs an address (--address or `address` in config)")?;
    controller.connect(&address).context("connect")?;
    if let Some(id) = network {
        controller.switch_network(id).context("switch network")?;
    }

    let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let (balance, gas_price, block_height) = rt.block_on(async {
        futures::join!(
            controller.query_balance(),
            controller.query_gas_price(),
            controller.query_block_height(),
        )
    });

    let report = SessionReport {
        generated_at: Local::now(),
        session: controller.state().clone(),
        network: controller.active_network().cloned(),
        balance: balance.into(),
        gas_price: gas_price.into(),
        block_height: block_height.into(),
    };
    println!("{}", report.to_json()?);
    Ok(())
}

fn run_tui(
    controller: SessionController,
    address: Option<String>,
    network: Option<u64>,
    warnings: Vec<String>,
) -> Result<()> {
    let runtime = RuntimeBridge::new(controller.client())?;

    let mut app = App::new(controller);
    if let Some(address) = address {
        app.start_session(&address, network);
    }
    for warning in warnings {
        tracing::warn!(%warning, "config");
        app.set_status(warning, StatusLevel::Warn);
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        match event {
            RuntimeEvent::BalanceReady { epoch, result } => app.apply_balance(epoch, result),
            RuntimeEvent::GasPriceReady { epoch, result } => app.apply_gas_price(epoch, result),
            RuntimeEvent::BlockHeightReady { epoch, result } => {
                app.apply_block_height(epoch, result)
            }
            RuntimeEvent::Error { message } => app.apply_runtime_error(message),
        }
    }

    if let Some(ticket) = app.take_fetch_request() {
        if let Err(err) = runtime.send(RuntimeCommand::Fetch { ticket }) {
            app.apply_runtime_error(format!("{err:#}"));
        }
    }
    if let Some(text) = app.take_copy_request() {
        copy_to_clipboard(app, text);
    }
    if app.take_export_request() {
        export_report(app);
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if app.help_open {
        if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q')) {
            app.help_open = false;
        }
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true
        }
        KeyCode::Char('?') => app.help_open = true,
        KeyCode::Char(':') => app.enter_command(),
        KeyCode::Char('c') => app.enter_command_with("connect "),
        KeyCode::Char('a') => app.enter_command_with("add-network "),
        KeyCode::Char('n') => app.enter_command_with("network "),
        KeyCode::Char('d') => run_command(app, Command::Disconnect),
        KeyCode::Char('r') => app.request_refresh(),
        KeyCode::Char('y') => run_command(app, Command::Copy),
        KeyCode::Char('o') => run_command(app, Command::Explorer),
        KeyCode::Char('e') => run_command(app, Command::Export),
        KeyCode::Tab => app.cycle_tab(),
        KeyCode::Char('1') => app.set_tab(Tab::Wallet),
        KeyCode::Char('2') => app.set_tab(Tab::Networks),
        KeyCode::Up | KeyCode::Char('k') if app.current_tab == Tab::Networks => {
            app.move_selection_up()
        }
        KeyCode::Down | KeyCode::Char('j') if app.current_tab == Tab::Networks => {
            app.move_selection_down()
        }
        KeyCode::Enter if app.current_tab == Tab::Networks => app.activate_selected_network(),
        KeyCode::Esc => app.set_tab(Tab::Wallet),
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Up => app.recall_last_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn run_command(app: &mut App, cmd: Command) {
    let action = app.execute_command(&cmd);
    app.apply_action(action);
}

fn copy_to_clipboard(app: &mut App, text: String) {
    use arboard::Clipboard;

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied: {}", text), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(err) => {
            tracing::warn!(error = %err, "clipboard unavailable");
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}

fn export_report(app: &mut App) {
    let Some(dir) = config::export_dir() else {
        app.set_status("No data directory for exports", StatusLevel::Error);
        return;
    };
    match export::write_report(&dir, &app.report()) {
        Ok(path) => {
            tracing::info!(path = %path.display(), "exported session report");
            app.set_status(format!("Exported {}", path.display()), StatusLevel::Info);
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "export failed");
            app.set_status(format!("Export failed: {err:#}"), StatusLevel::Error);
        }
    }
}
